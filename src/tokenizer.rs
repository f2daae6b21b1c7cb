use regex::Regex;

use crate::theme::Category;

/// One classified fragment of a source line. Concatenating the `text` of
/// every token for a line reproduces the line exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub category: Category,
}

pub const JS_KEYWORDS: &[&str] = &[
    "function", "var", "let", "const", "if", "else", "for", "while", "do", "switch", "case",
    "break", "continue", "return", "try", "catch", "finally", "throw", "new", "this", "typeof",
    "instanceof", "in", "of", "true", "false", "null", "undefined", "class", "extends", "import",
    "export", "async", "await",
];

pub const CSS_PROPERTIES: &[&str] = &[
    "margin",
    "padding",
    "border",
    "width",
    "height",
    "color",
    "background",
    "font-size",
    "font-family",
    "text-align",
    "display",
    "position",
    "top",
    "left",
    "right",
    "bottom",
    "flex",
    "grid",
    "justify-content",
    "align-items",
];

pub const JS_BUILTINS: &[&str] = &[
    "document",
    "window",
    "console",
    "alert",
    "setTimeout",
    "setInterval",
    "addEventListener",
    "getElementById",
    "querySelector",
    "Math",
    "Date",
    "Array",
    "Object",
    "String",
    "Number",
    "Boolean",
    "parseInt",
    "parseFloat",
    "canvas",
    "ctx",
    "fillRect",
    "strokeRect",
    "arc",
    "moveTo",
    "lineTo",
];

enum Matcher {
    /// Plain regex rule, applied anchored at the scan cursor.
    Pattern(Regex),
    /// Identifier immediately followed by `(`. The regex crate has no
    /// lookahead, so the call-site rule matches the identifier at the cursor
    /// and then peeks at the remainder for the opening paren.
    CallSite { ident: Regex, paren: Regex },
}

struct Rule {
    matcher: Matcher,
    category: Category,
}

impl Rule {
    /// Returns the match end (byte offset) if the rule matches starting
    /// exactly at `pos`. First-match-wins, not longest-match.
    fn match_at(&self, line: &str, pos: usize) -> Option<usize> {
        match &self.matcher {
            Matcher::Pattern(regex) => {
                let found = regex.find_at(line, pos)?;
                (found.start() == pos).then_some(found.end())
            }
            Matcher::CallSite { ident, paren } => {
                let found = ident.find_at(line, pos)?;
                if found.start() != pos {
                    return None;
                }
                paren.is_match(&line[found.end()..]).then_some(found.end())
            }
        }
    }
}

/// Regex-based lexical classifier for mixed HTML/CSS/JavaScript lines.
///
/// Rules form an ordered dispatch table evaluated top-to-bottom, anchored at
/// the scan cursor. Compiled once at construction; tokenizing only borrows.
pub struct Tokenizer {
    common: Vec<Rule>,
    css: Vec<Rule>,
    script: Vec<Rule>,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    pub fn new() -> Self {
        let pattern = |source: &str, category: Category| Rule {
            // Fixed literal patterns; compilation cannot fail.
            matcher: Matcher::Pattern(Regex::new(source).unwrap()),
            category,
        };
        let alternation = |words: &[&str]| words.join("|");

        let common = vec![
            pattern(r"//.*$|/\*.*?\*/", Category::Comment),
            pattern(r"<!--.*?-->", Category::Comment),
            pattern(r#""[^"]*"|'[^']*'"#, Category::String),
            pattern(r"\b\d+\.?\d*\b", Category::Number),
            pattern(r"</?[a-zA-Z][^>]*>", Category::Tag),
            pattern(
                &format!(r"\b(?:{})\b", alternation(JS_KEYWORDS)),
                Category::Keyword,
            ),
        ];

        let css = vec![
            pattern(
                &format!(r"\b(?:{})\b", alternation(CSS_PROPERTIES)),
                Category::CssProperty,
            ),
            pattern(r"#[0-9a-fA-F]{3,6}", Category::CssValue),
            pattern(r"\d+px|\d+%|\d+em", Category::CssValue),
        ];

        let script = vec![
            pattern(
                &format!(r"\b(?:{})\b", alternation(JS_BUILTINS)),
                Category::Function,
            ),
            Rule {
                matcher: Matcher::CallSite {
                    ident: Regex::new(r"\b\w+").unwrap(),
                    paren: Regex::new(r"^\s*\(").unwrap(),
                },
                category: Category::Function,
            },
        ];

        Self {
            common,
            css,
            script,
        }
    }

    /// Coarse per-line CSS detection: a brace plus a colon, a `px` unit, or
    /// a hex mark on the same physical line. Known approximation carried
    /// over deliberately; multi-line CSS rules fall back to script context.
    pub fn is_css_context(line: &str) -> bool {
        line.contains('{') && (line.contains(':') || line.contains("px") || line.contains('#'))
    }

    /// Splits one line into an ordered, lossless sequence of tokens.
    pub fn tokenize(&self, line: &str) -> Vec<Token> {
        if line.trim().is_empty() {
            return vec![Token {
                text: line.to_owned(),
                category: Category::Default,
            }];
        }

        // Whole-line comment shortcut, leading whitespace included.
        let trimmed = line.trim_start();
        if trimmed.starts_with("//") || trimmed.starts_with("/*") || line.contains("<!--") {
            return vec![Token {
                text: line.to_owned(),
                category: Category::Comment,
            }];
        }

        let contextual = if Self::is_css_context(line) {
            &self.css
        } else {
            &self.script
        };

        let mut tokens: Vec<Token> = Vec::new();
        let mut pos = 0;
        while pos < line.len() {
            let matched = self
                .common
                .iter()
                .chain(contextual.iter())
                .find_map(|rule| rule.match_at(line, pos).map(|end| (end, rule.category)));

            match matched {
                Some((end, category)) => {
                    push_token(&mut tokens, &line[pos..end], category);
                    pos = end;
                }
                None => {
                    // No rule applies here; emit one character as default.
                    // Guarantees the cursor always advances.
                    let ch_len = line[pos..]
                        .chars()
                        .next()
                        .map(char::len_utf8)
                        .unwrap_or(1);
                    push_token(&mut tokens, &line[pos..pos + ch_len], Category::Default);
                    pos += ch_len;
                }
            }
        }

        tokens
    }
}

/// Appends a fragment, merging runs of adjacent default text into one token.
fn push_token(tokens: &mut Vec<Token>, text: &str, category: Category) {
    if category == Category::Default {
        if let Some(last) = tokens.last_mut() {
            if last.category == Category::Default {
                last.text.push_str(text);
                return;
            }
        }
    }
    tokens.push(Token {
        text: text.to_owned(),
        category,
    });
}

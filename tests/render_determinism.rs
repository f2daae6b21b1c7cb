use codereel::renderer::{plan_dimensions, CodeImageGenerator};

const SAMPLE: &str = "const speed = 5;\n// paddle physics\nfunction move() {\n    player.y += speed;\n}";

fn render_hash(theme: &str, code: &str, title: Option<&str>) -> (u32, u32, u64) {
    // Built-in font keeps the test independent of installed system fonts.
    let mut generator = CodeImageGenerator::with_builtin_font(theme, 8.0);
    let image = generator.render(code, title);
    (image.width(), image.height(), fnv1a64(image.as_raw()))
}

#[test]
fn repeated_renders_are_pixel_identical() {
    let first = render_hash("dark", SAMPLE, Some("index.html - Lines 1-5"));
    let second = render_hash("dark", SAMPLE, Some("index.html - Lines 1-5"));
    assert_eq!(first, second, "render should be deterministic");
}

#[test]
fn same_generator_is_idempotent_across_calls() {
    let mut generator = CodeImageGenerator::with_builtin_font("light", 8.0);
    let first = generator.render(SAMPLE, None);
    let second = generator.render(SAMPLE, None);
    assert_eq!(first.dimensions(), second.dimensions());
    assert_eq!(fnv1a64(first.as_raw()), fnv1a64(second.as_raw()));
}

#[test]
fn themes_change_pixels_but_not_dimensions() {
    let dark = render_hash("dark", SAMPLE, None);
    let light = render_hash("light", SAMPLE, None);
    assert_eq!((dark.0, dark.1), (light.0, light.1));
    assert_ne!(dark.2, light.2, "palettes should differ visibly");
}

#[test]
fn unknown_theme_renders_like_dark() {
    let dark = render_hash("dark", SAMPLE, None);
    let fallback = render_hash("not-a-theme", SAMPLE, None);
    assert_eq!(dark, fallback);
}

#[test]
fn title_grows_the_canvas_vertically_only() {
    let untitled = render_hash("dark", SAMPLE, None);
    let titled = render_hash("dark", SAMPLE, Some("index.html - Dark Theme"));
    assert_eq!(untitled.0, titled.0);
    assert!(titled.1 > untitled.1);
}

#[test]
fn output_has_nominal_not_supersampled_dimensions() {
    let mut generator = CodeImageGenerator::with_builtin_font("dark", 8.0);
    let image = generator.render("x", None);
    // Built-in font at 8px advances 6px per cell; line height is 8 * 1.5.
    let plan = plan_dimensions(&["x"], 6, 12, false);
    assert_eq!(image.dimensions(), (plan.width, plan.height));
}

#[test]
fn rendered_canvas_contains_painted_pixels() {
    let mut generator = CodeImageGenerator::with_builtin_font("dark", 8.0);
    let image = generator.render("const x = 5;", None);
    let corner = *image.get_pixel(0, 0);
    assert!(
        image.pixels().any(|pixel| *pixel != corner),
        "canvas came back uniform; painting was lost"
    );
}

#[test]
fn empty_input_renders_without_panicking() {
    let mut generator = CodeImageGenerator::with_builtin_font("dark", 8.0);
    let image = generator.render("", None);
    assert!(image.width() > 0 && image.height() > 0);
}

fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut hash = 0xcbf2_9ce4_8422_2325_u64;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0001_0000_01b3);
    }
    hash
}

use eframe::egui::{self, Align2, Color32, CornerRadius, CursorIcon, FontId, Response, Sense, Ui};

/// Hover fade time; the color steps through 8 stops over this window.
pub const HOVER_FADE_SECS: f32 = 0.16;
const TWEEN_STEPS: f32 = 8.0;
const PRESSED_DARKEN: f32 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonPalette {
    pub base: Color32,
    pub hover: Color32,
    pub text: Color32,
}

impl ButtonPalette {
    pub const fn new(base: Color32, hover: Color32) -> Self {
        Self {
            base,
            hover,
            text: Color32::WHITE,
        }
    }
}

/// Per-channel linear blend, truncated toward zero like an integer cast.
pub fn tween_color(from: Color32, to: Color32, t: f32) -> Color32 {
    let t = t.clamp(0.0, 1.0);
    let channel = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t) as u8;
    Color32::from_rgb(
        channel(from.r(), to.r()),
        channel(from.g(), to.g()),
        channel(from.b(), to.b()),
    )
}

pub fn darken(color: Color32, factor: f32) -> Color32 {
    let channel = |c: u8| (c as f32 * factor) as u8;
    Color32::from_rgb(channel(color.r()), channel(color.g()), channel(color.b()))
}

/// Snaps a 0..=1 animation value onto the tween's discrete steps.
fn quantize(t: f32) -> f32 {
    (t * TWEEN_STEPS).floor() / TWEEN_STEPS
}

pub fn fill_color(palette: &ButtonPalette, hover_t: f32, pressed: bool) -> Color32 {
    let color = tween_color(palette.base, palette.hover, quantize(hover_t));
    if pressed {
        darken(color, PRESSED_DARKEN)
    } else {
        color
    }
}

/// Rounded button that fades to its hover color and darkens while held.
pub fn smooth_button(ui: &mut Ui, label: &str, width: f32, palette: &ButtonPalette) -> Response {
    let height = 42.0;
    let (rect, response) = ui.allocate_exact_size(egui::vec2(width, height), Sense::click());
    let hover_t = ui
        .ctx()
        .animate_bool_with_time(response.id, response.hovered(), HOVER_FADE_SECS);
    let fill = fill_color(palette, hover_t, response.is_pointer_button_down_on());

    if ui.is_rect_visible(rect) {
        let painter = ui.painter();
        painter.rect_filled(rect.shrink(2.0), CornerRadius::same(12), fill);
        painter.text(
            rect.center(),
            Align2::CENTER_CENTER,
            label,
            FontId::proportional(13.0),
            palette.text,
        );
    }

    response.on_hover_cursor(CursorIcon::PointingHand)
}

#[cfg(test)]
mod tests {
    use super::{darken, fill_color, tween_color, ButtonPalette};
    use eframe::egui::Color32;

    const GENERATE: ButtonPalette = ButtonPalette::new(
        Color32::from_rgb(0x10, 0xa3, 0x7f),
        Color32::from_rgb(0x0d, 0x8a, 0x72),
    );

    #[test]
    fn tween_hits_both_endpoints() {
        assert_eq!(tween_color(GENERATE.base, GENERATE.hover, 0.0), GENERATE.base);
        assert_eq!(tween_color(GENERATE.base, GENERATE.hover, 1.0), GENERATE.hover);
    }

    #[test]
    fn tween_truncates_midpoints() {
        let mid = tween_color(Color32::from_rgb(0, 100, 255), Color32::from_rgb(255, 0, 0), 0.5);
        assert_eq!(mid, Color32::from_rgb(127, 50, 127));
    }

    #[test]
    fn darken_scales_each_channel() {
        assert_eq!(
            darken(Color32::from_rgb(100, 200, 50), 0.7),
            Color32::from_rgb(70, 140, 35)
        );
    }

    #[test]
    fn pressed_state_darkens_current_fill() {
        assert_eq!(fill_color(&GENERATE, 1.0, false), GENERATE.hover);
        assert_eq!(fill_color(&GENERATE, 1.0, true), darken(GENERATE.hover, 0.7));
        assert_eq!(fill_color(&GENERATE, 0.1, false), GENERATE.base);
    }
}

use crate::ui::button::ButtonPalette;
use eframe::egui::{self, Color32, CornerRadius, FontId, Frame, Margin, Stroke, TextStyle};

#[derive(Debug, Clone)]
pub struct Theme {
    pub background: Color32,
    pub surface: Color32,
    pub surface_raised: Color32,
    pub accent: Color32,
    pub success: Color32,
    pub warning: Color32,
    pub danger: Color32,
    pub text_primary: Color32,
    pub text_code: Color32,
    pub text_muted: Color32,
    pub generate_button: ButtonPalette,
    pub deep_think_button: ButtonPalette,
    pub search_button: ButtonPalette,
    pub status_button: ButtonPalette,
    pub spacing_12: f32,
    pub radius_12: u8,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Color32::from_rgb(0x0D, 0x11, 0x17),
            surface: Color32::from_rgb(0x16, 0x1B, 0x22),
            surface_raised: Color32::from_rgb(0x21, 0x26, 0x2D),
            accent: Color32::from_rgb(0x10, 0xA3, 0x7F),
            success: Color32::from_rgb(0x22, 0xC5, 0x5E),
            warning: Color32::from_rgb(0xF5, 0x9E, 0x0B),
            danger: Color32::from_rgb(0xEF, 0x44, 0x44),
            text_primary: Color32::WHITE,
            text_code: Color32::from_rgb(0xE6, 0xED, 0xF3),
            text_muted: Color32::from_rgb(0x8B, 0x94, 0x9E),
            generate_button: ButtonPalette::new(
                Color32::from_rgb(0x10, 0xA3, 0x7F),
                Color32::from_rgb(0x0D, 0x8A, 0x72),
            ),
            deep_think_button: ButtonPalette::new(
                Color32::from_rgb(0x8B, 0x5C, 0xF6),
                Color32::from_rgb(0x7C, 0x3A, 0xED),
            ),
            search_button: ButtonPalette::new(
                Color32::from_rgb(0x0E, 0xA5, 0xE9),
                Color32::from_rgb(0x02, 0x84, 0xC7),
            ),
            status_button: ButtonPalette::new(
                Color32::from_rgb(0xF5, 0x9E, 0x0B),
                Color32::from_rgb(0xD9, 0x77, 0x06),
            ),
            spacing_12: 12.0,
            radius_12: 12,
        }
    }
}

impl Theme {
    pub fn apply_visuals(&self, ctx: &egui::Context) {
        let mut visuals = egui::Visuals::dark();
        visuals.panel_fill = self.background;
        visuals.override_text_color = Some(self.text_primary);
        visuals.extreme_bg_color = self.surface;
        visuals.widgets.noninteractive.bg_fill = self.surface;
        visuals.widgets.noninteractive.weak_bg_fill = self.surface;
        visuals.widgets.noninteractive.bg_stroke = Stroke::NONE;
        visuals.widgets.inactive.bg_fill = self.surface_raised;
        visuals.widgets.inactive.bg_stroke = Stroke::NONE;
        visuals.widgets.hovered.bg_fill = self.surface_raised;
        visuals.widgets.hovered.bg_stroke = Stroke::NONE;
        visuals.widgets.active.bg_fill = self.generate_button.hover;
        visuals.widgets.active.bg_stroke = Stroke::NONE;
        visuals.selection.bg_fill = self.generate_button.hover;
        visuals.text_cursor.stroke.color = self.text_code;
        visuals.window_fill = self.surface;
        visuals.window_stroke = Stroke::NONE;
        visuals.window_corner_radius = CornerRadius::same(self.radius_12);
        visuals.window_shadow = egui::epaint::Shadow {
            offset: [0, 8],
            blur: 24,
            spread: 0,
            color: Color32::from_rgba_premultiplied(0, 0, 0, 64),
        };

        let mut style = (*ctx.style()).clone();
        style.visuals = visuals;
        style.spacing.item_spacing = egui::vec2(10.0, 10.0);
        style.spacing.button_padding = egui::vec2(12.0, 8.0);
        style.text_styles.insert(TextStyle::Heading, FontId::proportional(24.0));
        style.text_styles.insert(TextStyle::Body, FontId::proportional(14.0));
        style.text_styles.insert(TextStyle::Monospace, FontId::monospace(13.0));
        style.text_styles.insert(TextStyle::Small, FontId::proportional(12.0));
        ctx.set_style(style);
    }

    pub fn input_frame(&self) -> Frame {
        Frame::new()
            .fill(self.surface)
            .inner_margin(Margin::symmetric(10, 8))
            .corner_radius(CornerRadius::same(self.radius_12))
            .stroke(Stroke::NONE)
    }

    pub fn code_frame(&self) -> Frame {
        Frame::new()
            .fill(self.surface)
            .inner_margin(Margin::same(self.spacing_12 as i8))
            .corner_radius(CornerRadius::same(self.radius_12))
            .stroke(Stroke::NONE)
    }

    pub fn status_bar_frame(&self) -> Frame {
        Frame::new()
            .fill(self.surface)
            .inner_margin(Margin::symmetric(10, 6))
    }
}

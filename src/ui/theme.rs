use egui::style::{Selection, WidgetVisuals, Widgets};
use egui::{Color32, FontFamily, FontId, Rounding, Stroke, Style, TextStyle, Visuals};

pub const BG_CANVAS: Color32 = Color32::from_rgb(0, 0, 0);
pub const BG_PANEL: Color32 = Color32::from_rgb(12, 13, 16);
pub const BG_WIDGET: Color32 = Color32::from_rgb(24, 26, 31);
pub const BG_WIDGET_HOVER: Color32 = Color32::from_rgb(34, 37, 44);
pub const BG_WIDGET_ACTIVE: Color32 = Color32::from_rgb(44, 48, 57);

pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(176, 178, 182);
pub const TEXT_MUTED: Color32 = Color32::from_rgb(110, 113, 120);
pub const TEXT_BRIGHT: Color32 = Color32::from_rgb(228, 230, 233);

pub const ACCENT_GREEN: Color32 = Color32::from_rgb(46, 204, 64);
pub const ACCENT_RED: Color32 = Color32::from_rgb(214, 69, 65);
pub const ACCENT_BLUE: Color32 = Color32::from_rgb(86, 156, 214);
pub const ACCENT_PURPLE: Color32 = Color32::from_rgb(156, 110, 230);
pub const ACCENT_ORANGE: Color32 = Color32::from_rgb(230, 150, 60);

pub const BORDER_SUBTLE: Color32 = Color32::from_rgb(40, 43, 50);
pub const BORDER_ACCENT: Color32 = Color32::from_rgb(36, 150, 52);

fn widget(bg: Color32, border: Stroke, fg: Color32, expansion: f32) -> WidgetVisuals {
    WidgetVisuals {
        bg_fill: bg,
        weak_bg_fill: bg,
        bg_stroke: border,
        rounding: Rounding::same(3.0),
        fg_stroke: Stroke::new(1.0, fg),
        expansion,
    }
}

fn visuals() -> Visuals {
    let subtle = Stroke::new(1.0, BORDER_SUBTLE);
    let accent = Stroke::new(1.0, BORDER_ACCENT);

    let mut noninteractive = widget(BG_WIDGET, subtle, TEXT_MUTED, 0.0);
    noninteractive.weak_bg_fill = BG_PANEL;

    Visuals {
        override_text_color: Some(TEXT_PRIMARY),
        widgets: Widgets {
            noninteractive,
            inactive: widget(BG_WIDGET, subtle, TEXT_PRIMARY, 0.0),
            hovered: widget(BG_WIDGET_HOVER, accent, TEXT_BRIGHT, 1.0),
            active: widget(BG_WIDGET_ACTIVE, Stroke::new(2.0, ACCENT_GREEN), TEXT_BRIGHT, 1.0),
            open: widget(BG_WIDGET_ACTIVE, accent, TEXT_BRIGHT, 0.0),
        },
        selection: Selection {
            bg_fill: ACCENT_GREEN.gamma_multiply(0.3),
            stroke: Stroke::new(1.0, ACCENT_GREEN),
        },
        hyperlink_color: ACCENT_BLUE,
        faint_bg_color: BG_PANEL,
        extreme_bg_color: BG_CANVAS,
        code_bg_color: BG_CANVAS,
        warn_fg_color: ACCENT_ORANGE,
        error_fg_color: ACCENT_RED,
        window_rounding: Rounding::same(6.0),
        window_fill: BG_PANEL,
        window_stroke: subtle,
        panel_fill: BG_PANEL,
        slider_trailing_fill: true,
        handle_shape: egui::style::HandleShape::Circle,
        menu_rounding: Rounding::same(3.0),
        ..Visuals::dark()
    }
}

/// lil-gui inspired dark palette for the settings panel.
pub fn apply_theme(ctx: &egui::Context) {
    let mut style = Style {
        visuals: visuals(),
        ..Style::default()
    };

    style.spacing.item_spacing = egui::vec2(8.0, 6.0);
    style.spacing.window_margin = egui::Margin::same(12.0);
    style.spacing.button_padding = egui::vec2(8.0, 4.0);
    style.spacing.indent = 14.0;
    style.spacing.slider_width = 170.0;

    style.text_styles = [
        (TextStyle::Small, FontId::new(11.0, FontFamily::Proportional)),
        (TextStyle::Body, FontId::new(13.0, FontFamily::Proportional)),
        (TextStyle::Button, FontId::new(13.0, FontFamily::Proportional)),
        (TextStyle::Heading, FontId::new(17.0, FontFamily::Proportional)),
        (TextStyle::Monospace, FontId::new(12.0, FontFamily::Monospace)),
    ]
    .into();

    ctx.set_style(style);
}

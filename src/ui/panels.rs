use egui::{Color32, Context, RichText, ScrollArea, Ui};

use crate::ui::binding::{ControlId, ControlKind, Edit, EditValue, Folder, Panel};
use crate::ui::theme::*;
use crate::viewer::ViewerState;

#[derive(Default)]
pub struct UiActions {
    pub edits: Vec<Edit>,
    pub set_vsync: Option<bool>,
    pub set_auto_rotate: Option<bool>,
}

pub struct PanelStatus {
    pub replacements: u64,
    pub vsync: bool,
    pub fps: f32,
}

pub fn draw_side_panel(ctx: &Context, panel: &Panel, state: &ViewerState, status: &PanelStatus) -> UiActions {
    let mut actions = UiActions::default();

    egui::SidePanel::right("control_panel")
        .min_width(300.0)
        .max_width(420.0)
        .default_width(340.0)
        .frame(egui::Frame::default().fill(BG_PANEL).inner_margin(16.0))
        .show(ctx, |ui| {
            ScrollArea::vertical().show(ui, |ui| {
                ui.heading(RichText::new("Primitive Viewer").strong());
                ui.add_space(4.0);
                ui.label(RichText::new("Shapes, materials & lights").color(TEXT_MUTED).size(11.0));
                ui.add_space(16.0);

                draw_folder_body(ui, panel, &panel.root, state, &mut actions.edits);

                ui.add_space(16.0);
                ui.separator();
                ui.add_space(12.0);

                section_header(ui, "VIEW");
                ui.horizontal(|ui| {
                    let mut auto_rotate = state.controls.auto_rotate;
                    if ui.checkbox(&mut auto_rotate, "Auto-rotate").changed() {
                        actions.set_auto_rotate = Some(auto_rotate);
                    }
                    let mut vsync = status.vsync;
                    if ui.checkbox(&mut vsync, "VSync").changed() {
                        actions.set_vsync = Some(vsync);
                    }
                });
                ui.add_space(16.0);

                stats_panel(ui, state, status);
            });
        });

    actions
}

fn section_header(ui: &mut Ui, text: &str) {
    ui.label(RichText::new(text).color(TEXT_MUTED).size(11.0).strong());
    ui.add_space(4.0);
}

fn draw_folder_body(ui: &mut Ui, panel: &Panel, folder: &Folder, state: &ViewerState, edits: &mut Vec<Edit>) {
    for id in &folder.controls {
        draw_control(ui, panel, *id, state, edits);
    }

    for child in &folder.folders {
        egui::CollapsingHeader::new(RichText::new(child.title).color(TEXT_BRIGHT))
            .id_salt(child.title)
            .default_open(false)
            .show(ui, |ui| {
                draw_folder_body(ui, panel, child, state, edits);
            });
    }
}

fn draw_control(ui: &mut Ui, panel: &Panel, id: ControlId, state: &ViewerState, edits: &mut Vec<Edit>) {
    let Some(control) = panel.control(id) else {
        return;
    };

    let Some(value) = panel.value(id, state) else {
        ui.label(RichText::new(control.label).color(TEXT_MUTED).italics());
        return;
    };

    let edited = match (&control.kind, value) {
        (ControlKind::Number { min, max, step, .. }, EditValue::Number(mut v)) => {
            let mut slider = egui::Slider::new(&mut v, *min..=*max).text(control.label);
            if let Some(step) = step {
                slider = slider.step_by(*step as f64);
            }
            ui.add(slider).changed().then_some(EditValue::Number(v))
        }
        (ControlKind::Toggle { .. }, EditValue::Toggle(mut v)) => {
            ui.checkbox(&mut v, control.label).changed().then_some(EditValue::Toggle(v))
        }
        (ControlKind::Choice { options, .. }, EditValue::Choice(current)) => {
            let mut selected = current;
            egui::ComboBox::from_id_salt(id)
                .selected_text(selected.name())
                .show_ui(ui, |ui| {
                    for option in options.iter() {
                        ui.selectable_value(&mut selected, *option, option.name());
                    }
                });
            ui.label(control.label);
            (selected != current).then_some(EditValue::Choice(selected))
        }
        _ => None,
    };

    if let Some(value) = edited {
        edits.push(Edit { control: id, value });
    }
}

fn stats_panel(ui: &mut Ui, state: &ViewerState, status: &PanelStatus) {
    section_header(ui, "STATISTICS");
    egui::Frame::default()
        .fill(BG_WIDGET)
        .stroke(egui::Stroke::new(1.0, BORDER_SUBTLE))
        .rounding(6.0)
        .inner_margin(12.0)
        .show(ui, |ui| {
            ui.style_mut().override_font_id = Some(egui::FontId::new(11.0, egui::FontFamily::Monospace));

            let fps_color = if status.fps >= 60.0 {
                ACCENT_GREEN
            } else if status.fps >= 30.0 {
                ACCENT_ORANGE
            } else {
                ACCENT_RED
            };

            egui::Grid::new("stats").num_columns(2).spacing([20.0, 4.0]).show(ui, |ui| {
                ui.label(RichText::new("FPS").color(TEXT_MUTED));
                ui.label(RichText::new(format!("{:.0}", status.fps)).color(fps_color));
                ui.end_row();

                if let Some(mesh) = state.scene.mesh() {
                    ui.label(RichText::new("Shape").color(TEXT_MUTED));
                    ui.label(RichText::new(mesh.geometry.kind().name()).color(ACCENT_BLUE));
                    ui.end_row();

                    let reads: Vec<&str> = mesh.geometry.kind().consumed_fields().iter().map(|f| f.label()).collect();
                    ui.label(RichText::new("Reads").color(TEXT_MUTED));
                    ui.label(RichText::new(reads.join(", ")).color(TEXT_PRIMARY));
                    ui.end_row();

                    ui.label(RichText::new("Vertices").color(TEXT_MUTED));
                    ui.label(RichText::new(fmt_num(mesh.geometry.mesh.vertex_count())).color(TEXT_PRIMARY));
                    ui.end_row();

                    ui.label(RichText::new("Triangles").color(TEXT_MUTED));
                    ui.label(RichText::new(fmt_num(mesh.geometry.mesh.triangle_count())).color(TEXT_PRIMARY));
                    ui.end_row();

                    if let Some((min, max)) = mesh.geometry.mesh.bounds() {
                        let size = max - min;
                        ui.label(RichText::new("Extent").color(TEXT_MUTED));
                        ui.label(RichText::new(format!("{:.2} x {:.2} x {:.2}", size.x, size.y, size.z)).color(TEXT_PRIMARY));
                        ui.end_row();
                    }
                }

                ui.label(RichText::new("Meshes").color(TEXT_MUTED));
                ui.label(RichText::new(state.scene.meshes().count().to_string()).color(TEXT_PRIMARY));
                ui.end_row();

                ui.label(RichText::new("Rebuilds").color(TEXT_MUTED));
                ui.label(RichText::new(status.replacements.to_string()).color(ACCENT_PURPLE));
                ui.end_row();
            });
        });
}

pub fn draw_help_overlay(ctx: &Context, state: &ViewerState) {
    let distance = state.camera.position.distance(state.controls.target);
    let (width, height) = state.viewport.size();

    egui::Area::new(egui::Id::new("help_overlay"))
        .anchor(egui::Align2::LEFT_BOTTOM, egui::vec2(12.0, -12.0))
        .show(ctx, |ui| {
            egui::Frame::default()
                .fill(Color32::from_black_alpha(180))
                .rounding(6.0)
                .inner_margin(10.0)
                .show(ui, |ui| {
                    ui.style_mut().override_font_id = Some(egui::FontId::new(11.0, egui::FontFamily::Monospace));
                    ui.label(RichText::new("LMB+Drag - Orbit | Scroll - Zoom | Space - Auto-rotate").color(TEXT_MUTED));
                    ui.label(RichText::new(format!("Distance: {distance:.2} | Viewport: {width}x{height}")).color(TEXT_MUTED));
                });
        });
}

fn fmt_num(n: usize) -> String {
    if n >= 1_000_000 {
        format!("{:.2}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn large_counts_are_abbreviated() {
        assert_eq!(fmt_num(42), "42");
        assert_eq!(fmt_num(1_536), "1.5K");
        assert_eq!(fmt_num(2_500_000), "2.50M");
    }
}

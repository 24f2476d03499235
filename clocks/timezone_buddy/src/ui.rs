//! UI module - egui side panel, modals and toasts
//!
//! Provides:
//! - Side panel: city search, hour offset slider, theme toggle, share link
//! - Name prompt, About and Dashboard windows
//! - Toast notifications

use nannou_egui::egui;
use shared::{Command, Dashboard, Notice, NoticeKind, Session, Theme, Visitor};

use crate::settings::Settings;

/// Seconds a toast stays on screen
pub const TOAST_SECS: f32 = 3.0;

/// State for the city search box
#[derive(Default)]
pub struct SearchState {
    pub query: String,
    /// Set to move keyboard focus into the search box next frame
    pub focus_requested: bool,
}

/// Result of side panel interactions
#[derive(Default)]
pub struct PanelResult {
    pub command: Option<Command>,
    pub copy_link: bool,
    pub open_about: bool,
    pub open_dashboard: bool,
}

/// Open/closed state of the windows
#[derive(Default)]
pub struct Modals {
    pub about_open: bool,
    pub name_open: bool,
    pub name_input: String,
    pub dashboard: Option<Dashboard>,
}

impl Modals {
    /// Escape closes About and the Dashboard; the name prompt stays up
    pub fn close_dismissable(&mut self) {
        self.about_open = false;
        self.dashboard = None;
    }
}

struct Toast {
    notice: Notice,
    shown_at: f32,
}

/// Stack of transient notices, newest at the bottom
#[derive(Default)]
pub struct Toasts {
    items: Vec<Toast>,
}

impl Toasts {
    pub fn push(&mut self, notice: Notice, now: f32) {
        self.items.push(Toast {
            notice,
            shown_at: now,
        });
    }

    /// Drop toasts older than [`TOAST_SECS`]
    pub fn expire(&mut self, now: f32) {
        self.items.retain(|t| now - t.shown_at < TOAST_SECS);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn draw(&self, ctx: &egui::Context) {
        if self.items.is_empty() {
            return;
        }
        egui::Area::new("toasts")
            .anchor(egui::Align2::RIGHT_BOTTOM, [-16.0, -16.0])
            .show(ctx, |ui| {
                for toast in &self.items {
                    let color = match toast.notice.kind {
                        NoticeKind::Success => egui::Color32::from_rgb(100, 200, 150),
                        NoticeKind::Error => egui::Color32::from_rgb(230, 100, 100),
                        NoticeKind::Info => egui::Color32::from_rgb(140, 170, 230),
                    };
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        ui.colored_label(color, &toast.notice.message);
                    });
                    ui.add_space(6.0);
                }
            });
    }
}

/// Match egui's visuals to the widget theme
pub fn apply_theme(ctx: &egui::Context, theme: Theme) {
    let visuals = match theme {
        Theme::Dark => egui::Visuals::dark(),
        Theme::Light => egui::Visuals::light(),
    };
    ctx.set_visuals(visuals);
}

fn hint(ui: &mut egui::Ui, text: &str) {
    ui.label(
        egui::RichText::new(text)
            .size(10.0)
            .color(egui::Color32::from_rgb(120, 125, 135)),
    );
}

/// Draw the side panel (left)
pub fn draw_side_panel(
    ctx: &egui::Context,
    search: &mut SearchState,
    session: &Session,
    settings: &Settings,
    width: f32,
) -> PanelResult {
    let mut result = PanelResult::default();
    let model = session.model();

    egui::SidePanel::left("buddy_panel")
        .resizable(false)
        .exact_width(width)
        .show(ctx, |ui| {
            ui.add_space(10.0);
            ui.heading("TimeZone Buddy");
            ui.add_space(10.0);

            // City search
            let response = ui.add(
                egui::TextEdit::singleline(&mut search.query)
                    .hint_text("Search cities or countries…")
                    .desired_width(f32::INFINITY),
            );
            if search.focus_requested {
                response.request_focus();
                search.focus_requested = false;
            }

            if !search.query.trim().is_empty() {
                let matches = session.search(&search.query, settings.search_limit);
                egui::Frame::group(ui.style()).show(ui, |ui| {
                    if matches.is_empty() {
                        ui.label("No cities found");
                    }
                    for record in matches {
                        let label = format!("{}\n{}", record.city, record.country);
                        if ui
                            .selectable_label(false, label)
                            .on_hover_text(&record.timezone)
                            .clicked()
                        {
                            result.command = Some(Command::AddZone(record));
                            search.query.clear();
                        }
                    }
                });
            }

            ui.add_space(10.0);
            ui.separator();
            ui.add_space(10.0);

            // Hour offset
            ui.label("Hour offset");
            let mut offset = model.hour_offset;
            let range = settings.offset_range(offset);
            let slider = egui::Slider::new(&mut offset, range).suffix("h");
            if ui.add(slider).changed() {
                result.command = Some(Command::SetOffset(offset));
            }
            hint(ui, "See what time it will be N hours from now");

            ui.add_space(10.0);
            ui.separator();
            ui.add_space(10.0);

            // Theme, sharing, windows
            let theme_label = match model.theme {
                Theme::Light => "🌙 Dark mode",
                Theme::Dark => "☀ Light mode",
            };
            if ui.button(theme_label).clicked() {
                result.command = Some(Command::ToggleTheme);
            }
            if ui.button("🔗 Copy share link").clicked() {
                result.copy_link = true;
            }
            if ui.button("📊 Dashboard").clicked() {
                result.open_dashboard = true;
            }
            if ui.button("ℹ About").clicked() {
                result.open_about = true;
            }

            ui.add_space(10.0);
            ui.separator();
            ui.add_space(10.0);

            ui.label(
                egui::RichText::new(format!("{} cities selected", model.len()))
                    .size(11.0)
                    .color(egui::Color32::from_rgb(140, 145, 155)),
            );
            hint(ui, "Drag cards to reorder");

            ui.add_space(10.0);
            hint(ui, "Keyboard:");
            hint(ui, "A  Search cities");
            hint(ui, "T  Toggle theme");
            hint(ui, "S  Copy share link");
            hint(ui, "Esc  Close windows");
        });

    result
}

/// First-launch name prompt; returns the submitted text
pub fn draw_name_prompt(ctx: &egui::Context, modals: &mut Modals) -> Option<String> {
    if !modals.name_open {
        return None;
    }
    let mut submitted = None;

    egui::Window::new("Welcome!")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.label("What should we call you?");
            let response = ui.text_edit_singleline(&mut modals.name_input);
            let entered =
                response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.button("Get started").clicked() || entered {
                submitted = Some(modals.name_input.clone());
            }
        });

    submitted
}

/// About window
pub fn draw_about(ctx: &egui::Context, open: &mut bool) {
    egui::Window::new("About TimeZone Buddy")
        .open(open)
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.label("Keep an eye on the time wherever your people are.");
            ui.add_space(6.0);
            ui.label("• Search for a city to add a card");
            ui.label("• Drag cards to reorder them");
            ui.label("• Use the hour offset to plan ahead");
            ui.label("• Copy the share link to send your board to someone else");
            ui.add_space(6.0);
            hint(ui, "Green cards are inside working hours (9:00 - 18:59).");
        });
}

/// Dashboard window; returns false once closed
pub fn draw_dashboard(
    ctx: &egui::Context,
    dashboard: &Dashboard,
    visitors: Option<&[Visitor]>,
) -> bool {
    let mut open = true;

    egui::Window::new("📊 Dashboard")
        .open(&mut open)
        .collapsible(false)
        .resizable(true)
        .default_width(380.0)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            egui::Grid::new("dashboard_stats")
                .num_columns(2)
                .spacing([24.0, 4.0])
                .show(ui, |ui| {
                    ui.label("User");
                    ui.strong(&dashboard.user_name);
                    ui.end_row();
                    ui.label("Session time");
                    ui.strong(format!("{} minutes", dashboard.session_minutes));
                    ui.end_row();
                    ui.label("Cities");
                    ui.strong(dashboard.cities.to_string());
                    ui.end_row();
                    ui.label("Theme toggles");
                    ui.strong(dashboard.theme_toggles.to_string());
                    ui.end_row();
                });

            ui.separator();
            ui.label("Recent activity");
            egui::ScrollArea::vertical()
                .id_source("dashboard_activity")
                .max_height(160.0)
                .show(ui, |ui| {
                    if dashboard.recent.is_empty() {
                        ui.label("No activities yet");
                    }
                    for entry in &dashboard.recent {
                        hint(ui, &format!("{} - {}", entry.time, entry.action));
                    }
                });

            ui.separator();
            match visitors {
                None => {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label("Loading visitors…");
                    });
                }
                Some([]) => {
                    ui.label("Visitors: 0");
                    hint(ui, "No visitors yet");
                }
                Some(list) => {
                    ui.label(format!("Visitors: {}", list.len()));
                    egui::ScrollArea::vertical()
                        .id_source("dashboard_visitors")
                        .max_height(140.0)
                        .show(ui, |ui| {
                            for visitor in list {
                                ui.horizontal(|ui| {
                                    ui.label(&visitor.name);
                                    ui.with_layout(
                                        egui::Layout::right_to_left(egui::Align::Center),
                                        |ui| hint(ui, &visitor.date),
                                    );
                                });
                            }
                        });
                }
            }
        });

    open
}

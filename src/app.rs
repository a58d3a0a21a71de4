use std::{collections::HashMap, time::Duration};

// eframe/egui for GUI application framework
use eframe::{App, Frame, egui};
use egui::{ColorImage, TextureHandle, TextureOptions};
// FileDialog for folder selection dialogs
use rfd::FileDialog;
use tracing::warn;

use tube_queue::{Controller, DownloadFormat, QueueError};

/// Modal message shown over the window
struct Notice {
    title: &'static str,
    message: String,
}

/// Application state for the GUI
pub struct QueueApp {
    /// Queue, thumbnails and settings
    controller: Controller,
    /// Input field for the YouTube URL
    url_input: String,
    /// Format for the next queued item
    format: DownloadFormat,
    /// Selected row in the queue list
    selected: Option<usize>,
    /// Uploaded thumbnail textures, keyed by video id
    textures: HashMap<String, TextureHandle>,
    notice: Option<Notice>,
}

impl QueueApp {
    pub fn new(ctx: &egui::Context, controller: Controller, initial_url: Option<String>) -> Self {
        let mut app = Self {
            controller,
            url_input: String::new(),
            format: DownloadFormat::default(),
            selected: None,
            textures: HashMap::new(),
            notice: None,
        };

        // Launched through the ytdlp:// handler: queue it right away and keep the text.
        if let Some(url) = initial_url {
            app.url_input = url;
            app.add_to_queue(ctx, true);
        }
        app
    }

    fn add_to_queue(&mut self, ctx: &egui::Context, keep_input: bool) {
        match self.controller.enqueue(&self.url_input, self.format) {
            Ok(index) => {
                if !keep_input {
                    self.url_input.clear();
                }
                if self.selected.is_none() {
                    self.select(ctx, index);
                }
            }
            Err(err) => self.show_error(err),
        }
    }

    fn download_all(&mut self) {
        if let Err(err) = self.controller.download_all() {
            self.show_error(err);
        }
    }

    fn save_thumbnail(&mut self) {
        let Some(index) = self.selected else {
            self.show_error(QueueError::NoSelection);
            return;
        };
        match self.controller.save_thumbnail(index) {
            Ok(path) => {
                self.notice = Some(Notice {
                    title: "Thumbnail saved",
                    message: format!("Thumbnail saved to:\n{}", path.display()),
                });
            }
            Err(err) => self.show_error(err),
        }
    }

    fn choose_download_folder(&mut self) {
        let Some(folder) = FileDialog::new()
            .set_directory(self.controller.download_dir())
            .pick_folder()
        else {
            return;
        };
        if let Err(err) = self.controller.set_download_dir(&folder) {
            self.show_error(err);
        }
    }

    fn open_download_folder(&self) {
        let folder = self.controller.download_dir().to_path_buf();
        std::thread::spawn(move || {
            #[cfg(target_os = "windows")]
            let opener = "explorer";
            #[cfg(target_os = "macos")]
            let opener = "open";
            #[cfg(all(unix, not(target_os = "macos")))]
            let opener = "xdg-open";

            if let Err(err) = std::process::Command::new(opener).arg(&folder).spawn() {
                warn!(error = %err, "could not open download folder");
            }
        });
    }

    /// Selects a row and uploads its thumbnail if it is not on the GPU yet.
    fn select(&mut self, ctx: &egui::Context, index: usize) {
        self.selected = Some(index);

        let Some(video_id) = self
            .controller
            .queue()
            .get(index)
            .map(|item| item.video_id.clone())
        else {
            return;
        };
        if self.textures.contains_key(&video_id) {
            return;
        }
        if let Some(thumb) = self.controller.thumbnail_for(index) {
            let img = ColorImage::from_rgba_unmultiplied(thumb.size(), thumb.image.as_raw());
            let tex = ctx.load_texture(&video_id, img, TextureOptions::default());
            self.textures.insert(video_id, tex);
        }
    }

    fn show_error(&mut self, err: QueueError) {
        let title = match err {
            QueueError::EmptyQueue | QueueError::NoSelection => "Info",
            _ => "Error",
        };
        self.notice = Some(Notice {
            title,
            message: err.to_string(),
        });
    }

    fn preview_panel(&self, ctx: &egui::Context) {
        egui::SidePanel::right("preview_panel")
            .min_width(340.0)
            .show(ctx, |ui| {
                ui.heading("Thumbnail preview");
                ui.separator();

                let texture = self
                    .selected
                    .and_then(|i| self.controller.queue().get(i))
                    .and_then(|item| self.textures.get(&item.video_id));
                match (self.selected, texture) {
                    (_, Some(tex)) => {
                        ui.add(egui::Image::new(tex).max_width(320.0));
                    }
                    (Some(_), None) => {
                        ui.label("Thumbnail not available");
                    }
                    (None, None) => {
                        ui.label("Thumbnail");
                    }
                }
            });
    }

    fn notice_window(&mut self, ctx: &egui::Context) {
        let Some(notice) = &self.notice else {
            return;
        };
        let mut close = false;
        egui::Window::new(notice.title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(&notice.message);
                if ui.button("OK").clicked() {
                    close = true;
                }
            });
        if close {
            self.notice = None;
        }
    }
}

/// GUI update loop: called each frame to redraw and handle interactions
impl App for QueueApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        // Apply whatever the workers reported since the last frame
        self.controller.poll_status();

        self.preview_panel(ctx);

        let mut clicked_row = None;
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("YT-DLP Downloader");
            ui.label("Download YouTube videos as MP4 or MP3, with a queue and thumbnails.");
            ui.add_space(8.0);

            ui.horizontal(|ui| {
                ui.label("URL:");
                ui.add(
                    egui::TextEdit::singleline(&mut self.url_input)
                        .hint_text("Paste a YouTube URL or ytdlp://<VIDEO_ID>")
                        .desired_width(360.0),
                );
                egui::ComboBox::from_label("Format")
                    .selected_text(self.format.label())
                    .show_ui(ui, |ui| {
                        for format in [DownloadFormat::Mp4, DownloadFormat::Mp3] {
                            ui.selectable_value(&mut self.format, format, format.label());
                        }
                    });
                if ui.button("Add to queue").clicked() {
                    self.add_to_queue(ctx, false);
                }
            });

            ui.horizontal(|ui| {
                if ui.button("Download all").clicked() {
                    self.download_all();
                }
                if ui.button("Save thumbnail").clicked() {
                    self.save_thumbnail();
                }
                if ui.button("Download folder").clicked() {
                    self.choose_download_folder();
                }
                if ui.button("Open folder").clicked() {
                    self.open_download_folder();
                }
            });

            ui.horizontal(|ui| {
                ui.label("Download to:");
                ui.label(self.controller.download_dir().display().to_string());
            });
            ui.separator();

            egui::ScrollArea::vertical()
                .auto_shrink([false; 2])
                .show(ui, |ui| {
                    for item in self.controller.queue().items() {
                        let selected = self.selected == Some(item.index);
                        if ui.selectable_label(selected, item.display_text()).clicked() {
                            clicked_row = Some(item.index);
                        }
                    }
                });
        });

        if let Some(index) = clicked_row {
            self.select(ctx, index);
        }

        self.notice_window(ctx);

        // Request periodic repaint so worker reports show up
        ctx.request_repaint_after(Duration::from_millis(100));
    }
}

// Window front end: shows the display path, turns keys and mouse into studio commands.
// Keys: G gray, B blur, E edges, S sharpen, H hue, Up/Down blur size, Left/Right hue,
// -/= brightness, ,/. contrast (previewed), Enter commit adjustment, Backspace cancel,
// Z undo, Y redo, X reset, L live on/off, F freeze live frame, C clear strokes,
// P paint strokes into history, W save, ESC quit. Hold LMB to draw.

use std::path::Path;
use std::time::Instant;

use anyhow::Context as _;
use dip_studio::present::{Viewport, render_letterboxed};
use dip_studio::session::{ADJUST_MAX, BLUR_KERNEL_MAX, HUE_MAX_DEGREES};
use dip_studio::{CaptureDevice, Command, Operation, Studio, StudioConfig};
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

const BACKGROUND: u32 = 0x00_20_20_20;

pub struct Drawer {
    window: Window,
}

impl Drawer {
    pub fn new(title: &str, width: usize, height: usize) -> anyhow::Result<Self> {
        let opts = WindowOptions {
            resize: true,
            ..WindowOptions::default()
        };
        let mut window = Window::new(title, width, height, opts).context("create window")?;
        window.set_target_fps(60);
        Ok(Self { window })
    }

    pub fn present(&mut self, pixels: &[u32], width: usize, height: usize) -> anyhow::Result<()> {
        self.window
            .update_with_buffer(pixels, width, height)
            .context("update window buffer")
    }

    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    pub fn esc_pressed(&self) -> bool {
        self.window.is_key_down(Key::Escape)
    }

    pub fn pressed_once(&self, key: Key) -> bool {
        self.window.is_key_pressed(key, KeyRepeat::No)
    }

    pub fn pressed_repeat(&self, key: Key) -> bool {
        self.window.is_key_pressed(key, KeyRepeat::Yes)
    }

    /// Mouse position in window pixels, even outside the window while dragging.
    pub fn mouse_pos(&self) -> Option<(f32, f32)> {
        self.window.get_mouse_pos(MouseMode::Pass)
    }

    pub fn left_mouse_down(&self) -> bool {
        self.window.get_mouse_down(MouseButton::Left)
    }

    pub fn size(&self) -> (usize, usize) {
        self.window.get_size()
    }

    pub fn set_title(&mut self, title: &str) {
        self.window.set_title(title);
    }
}

/// Slider positions; brightness/contrast are previewed until committed.
struct Controls {
    blur_kernel: u32,
    edge_low: u8,
    edge_high: u8,
    hue: i32,
    brightness: i32,
    contrast: i32,
}

impl Controls {
    fn adjustment(&self) -> Operation {
        Operation::BrightnessContrast {
            brightness: self.brightness,
            contrast: self.contrast,
        }
    }
}

pub fn run<D: CaptureDevice>(studio: &mut Studio<D>, config: &StudioConfig, save_to: &Path) -> anyhow::Result<()> {
    let (w, h) = studio
        .source_frame()
        .map(|f| (f.width() as usize, f.height() as usize))
        .unwrap_or((config.camera.width as usize, config.camera.height as usize));
    let mut drawer = Drawer::new("dip-studio", w, h)?;

    let s = &config.sliders;
    let mut controls = Controls {
        blur_kernel: s.blur_kernel,
        edge_low: s.edge_low,
        edge_high: s.edge_high,
        hue: s.hue,
        brightness: s.brightness,
        contrast: s.contrast,
    };

    let tick_every = config.tick_interval();
    let mut last_tick = Instant::now();
    let mut viewport = Viewport {
        x: 0,
        y: 0,
        width: 0,
        height: 0,
    };
    let mut pen_down = false;

    while drawer.is_open() && !drawer.esc_pressed() {
        // 1) Keys -> commands
        for cmd in key_commands(&drawer, &mut controls, studio.live().is_active(), save_to) {
            studio.submit(cmd);
        }

        // 2) Mouse -> strokes, in frame coordinates
        let dims = studio.source_frame().map(|f| (f.width(), f.height()));
        if let Some((fw, fh)) = dims {
            match (drawer.left_mouse_down(), drawer.mouse_pos()) {
                (true, Some((mx, my))) => {
                    let p = viewport.to_frame_point(mx, my, fw, fh);
                    // visual: a pen line follows the cursor while LMB is held
                    studio.submit(if pen_down {
                        Command::ExtendStroke(p)
                    } else {
                        Command::BeginStroke(p)
                    });
                    pen_down = true;
                }
                (false, _) if pen_down => {
                    studio.submit(Command::EndStroke);
                    pen_down = false;
                }
                _ => {}
            }
        }

        // 3) Capture tick (visual: live feed advances ~33 times a second by default)
        if last_tick.elapsed() >= tick_every {
            studio.submit(Command::Tick);
            last_tick = Instant::now();
        }

        // 4) Run everything queued this frame, in order
        for res in studio.drain() {
            if let Err(e) = res {
                tracing::warn!(error = %e, "command failed");
            }
        }

        // 5) Present: frame scaled to fit, grey bars fill the rest of the window
        let (vw, vh) = drawer.size();
        let pixels = match studio.frame_for_display() {
            Some(frame) => {
                let (px, vp) = render_letterboxed(&frame, vw as u32, vh as u32, BACKGROUND);
                viewport = vp;
                px
            }
            None => vec![BACKGROUND; vw * vh],
        };
        drawer.set_title(&status_line(studio, &controls)); // visual: mode + history in the title bar
        drawer.present(&pixels, vw, vh)?;
    }

    Ok(())
}

fn key_commands(drawer: &Drawer, c: &mut Controls, live: bool, save_to: &Path) -> Vec<Command> {
    let mut out = Vec::new();

    if drawer.pressed_repeat(Key::Up) {
        c.blur_kernel = (c.blur_kernel + 1).min(BLUR_KERNEL_MAX);
    }
    if drawer.pressed_repeat(Key::Down) {
        c.blur_kernel = c.blur_kernel.saturating_sub(1).max(1);
    }
    if drawer.pressed_repeat(Key::Right) {
        c.hue = (c.hue + 10).min(HUE_MAX_DEGREES);
    }
    if drawer.pressed_repeat(Key::Left) {
        c.hue = (c.hue - 10).max(-HUE_MAX_DEGREES);
    }

    let mut adjusted = false;
    for (key, db, dc) in [
        (Key::Minus, -10, 0),
        (Key::Equal, 10, 0),
        (Key::Comma, 0, -10),
        (Key::Period, 0, 10),
    ] {
        if drawer.pressed_repeat(key) {
            c.brightness = (c.brightness + db).clamp(-ADJUST_MAX, ADJUST_MAX);
            c.contrast = (c.contrast + dc).clamp(-ADJUST_MAX, ADJUST_MAX);
            adjusted = true;
        }
    }
    if adjusted {
        // visual: image brightens/darkens at once, history untouched until Enter
        out.push(Command::Preview(c.adjustment()));
    }

    let once = [
        (Key::G, Command::Commit(Operation::Grayscale)),
        (Key::B, Command::Commit(Operation::Blur { kernel: c.blur_kernel })),
        (
            Key::E,
            Command::Commit(Operation::EdgeDetect {
                low: c.edge_low,
                high: c.edge_high,
            }),
        ),
        (Key::S, Command::Commit(Operation::Sharpen)),
        (Key::H, Command::Commit(Operation::HueShift { degrees: c.hue })),
        (Key::Enter, Command::Commit(c.adjustment())),
        (Key::Backspace, Command::CancelPreview),
        (Key::Z, Command::Undo),
        (Key::Y, Command::Redo),
        (Key::X, Command::Reset),
        (Key::L, if live { Command::StopLive } else { Command::StartLive }),
        (Key::F, Command::FreezeLive),
        (Key::C, Command::ClearOverlay),
        (Key::P, Command::CommitOverlay),
        (Key::W, Command::Save(save_to.to_path_buf())),
    ];
    for (key, cmd) in once {
        if drawer.pressed_once(key) {
            out.push(cmd);
        }
    }
    out
}

fn status_line<D: CaptureDevice>(studio: &Studio<D>, c: &Controls) -> String {
    let session = studio.session();
    let mode = if studio.live().is_active() { "LIVE" } else { "EDIT" };
    format!(
        "dip-studio | {mode} | history {} redo {} | blur {} hue {} bright {} contrast {}",
        session.history_len(),
        session.redo_len(),
        c.blur_kernel,
        c.hue,
        c.brightness,
        c.contrast
    )
}

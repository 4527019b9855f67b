use std::sync::Arc;
use std::thread;

use sdl2::keyboard::Keycode;
use tortuga::display::{Display, InputEvent, RenderTarget};
use tortuga::text::GlyphSource;
use tortuga::util::FpsCounter;
use tortuga::{Actor, Align, Canvas, Color, EngineConfig, ImageFormat, PixelFont, SharedCanvas};

const SNAPSHOT_PATH: &str = "tortuga.png";

struct Options {
    config: Option<String>,
    vsync: bool,
    wrap: bool,
}

/// Parse command line arguments
fn parse_args() -> Options {
    let args: Vec<String> = std::env::args().collect();
    let mut options = Options {
        config: None,
        vsync: true,
        wrap: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--no-vsync" => options.vsync = false,
            "--wrap" => options.wrap = true,
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    options.config = Some(args[i + 1].clone());
                    i += 1;
                }
            },
            "--help" => {
                println!("Usage: tortuga-viewer [OPTIONS]");
                println!();
                println!("Options:");
                println!("  --config PATH, -c PATH  Load engine defaults from a JSON file");
                println!("  --wrap                  Run the demo on a toroidal canvas");
                println!("  --no-vsync              Disable VSync");
                println!("  --help                  Show this help message");
                std::process::exit(0);
            },
            _ => {},
        }
        i += 1;
    }
    options
}

/// Row for the FPS label, 4 px above the bottom; pinned to the top when the
/// canvas is shorter than that
fn overlay_top(frame_height: u32, label_height: u32) -> i32 {
    frame_height.saturating_sub(label_height + 4) as i32
}

/// Star spiral, a flood fill, a circle and a caption
fn demo(canvas: &Arc<SharedCanvas>, wrap: bool) -> tortuga::Result<Actor> {
    let mut t = Actor::new(canvas)?;
    if wrap {
        t.wrap();
    }
    t.set_pen_width(2.0);
    for i in 0..36 {
        if canvas.is_disposed() {
            return Ok(t);
        }
        t.forward(120.0 + f64::from(i) * 4.0).right(170.0);
    }
    t.pen_up().home().pen_down();
    t.set_fill_color(Color::ORANGE).fill();
    t.set_pen_color(Color::RED).right_circle(60.0);
    t.pen_up().set_pos(-190.0, -180.0);
    t.set_pen_color(Color::DARK_GRAY).label("tortuga", Align::Left);
    t.home();
    Ok(t)
}

fn main() -> Result<(), String> {
    tortuga::logging::init();
    let options = parse_args();

    let config = match &options.config {
        Some(path) => EngineConfig::load(path).map_err(|e| e.to_string())?,
        None => EngineConfig::default(),
    };
    let canvas = Canvas::from_config(&config).into_shared();
    let (width, height) = (config.canvas_width + 1, config.canvas_height + 1);

    let (mut display, texture_creator) =
        Display::with_options("tortuga", width, height, options.vsync)?;
    let mut target = RenderTarget::with_size(&texture_creator, width, height)?;

    let worker = {
        let canvas = Arc::clone(&canvas);
        let wrap = options.wrap;
        thread::spawn(move || demo(&canvas, wrap))
    };

    let mut fps_counter = FpsCounter::new(60);
    let mut show_fps = false;
    let font = PixelFont::new(1);
    let mut frame = canvas.lock().compose();

    println!("=== tortuga ===");
    println!("Canvas: {}x{}", config.canvas_width, config.canvas_height);
    println!("Controls:");
    println!("  F       - Toggle FPS display");
    println!("  S       - Save snapshot to {}", SNAPSHOT_PATH);
    println!("  Escape  - Quit");

    'main: loop {
        let (_dt, avg_fps) = fps_counter.tick();

        for event in display.poll_events() {
            match event {
                InputEvent::Quit | InputEvent::KeyDown(Keycode::Escape) => break 'main,
                InputEvent::KeyDown(Keycode::F) => show_fps = !show_fps,
                InputEvent::KeyDown(Keycode::S) => {
                    match canvas.lock().save(SNAPSHOT_PATH, ImageFormat::Png) {
                        Ok(()) => println!("Snapshot saved to {}", SNAPSHOT_PATH),
                        Err(e) => eprintln!("Failed to save: {}", e),
                    }
                },
                InputEvent::KeyDown(_) => {},
            }
        }

        {
            let mut guard = canvas.lock();
            if guard.take_redisplay() || show_fps {
                frame = guard.compose();
            }
        }

        // FPS overlay (press F to toggle)
        if show_fps {
            let text = format!("FPS {} {}ms", avg_fps as u32, fps_counter.avg_frame_time_ms() as u32);
            let label = font.render(&text, Color::MAGENTA);
            frame.composite(&label, 4, overlay_top(frame.height(), label.height()));
        }

        display.present(&mut target, &frame)?;
    }

    canvas.dispose();
    match worker.join() {
        Ok(Ok(_actor)) => {},
        Ok(Err(e)) => eprintln!("Demo failed: {}", e),
        Err(_) => eprintln!("Demo thread panicked"),
    }
    Ok(())
}

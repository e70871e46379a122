//! Audiosphere - Audio-reactive particle visualizer
//!
//! Five independently configured particle groups swirl through seeded
//! gradient noise, each listening to its own slice of the spectrum:
//! bass kicks launch expanding shock waves, spectral peaks reshuffle
//! the turbulence, and the whole cloud rotates with the volume.

mod analysis;
mod audio;
mod beat;
mod camera;
mod cli;
mod group;
mod noise;
mod params;
mod presets;
mod rendering;
mod sim;

use std::sync::Arc;
use std::time::Instant;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use clap::Parser;
use glam::Mat4;
use rand::rngs::StdRng;
use rand::SeedableRng;

use audio::AudioSystem;
use beat::BeatManager;
use camera::CameraSystem;
use cli::Args;
use group::ParticleGroup;
use noise::NoiseField;
use params::{FftConfig, RecordingConfig, RenderConfig, GROUP_COUNT};
use rendering::{PointUniforms, RenderSystem};
use sim::FrameContext;

/// Seconds per frame-rate estimation window
const FPS_WINDOW_S: f32 = 0.5;

/// Main application state
struct App {
    // Window and rendering
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,

    // Simulation systems
    groups: Vec<ParticleGroup>,
    noise: NoiseField,
    beat: BeatManager,
    camera: CameraSystem,
    audio: Option<AudioSystem>,
    rng: StdRng,

    // Configuration
    audio_input: audio::AudioInput,
    render_config: RenderConfig,
    recording_config: Option<RecordingConfig>,

    // Time tracking
    start_time: Instant,
    last_frame: Instant,
    frame_num: usize,
    fps_window_start: Instant,
    fps_window_frames: u32,
    estimated_fps: f32,
}

impl App {
    fn new(args: &Args) -> Result<Self, String> {
        let audio_input = args.parse_input()?;
        let recording_config = args.create_recording_config()?;
        let render_config = RenderConfig::default();

        let mut rng = StdRng::seed_from_u64(args.seed);
        let noise = NoiseField::new(args.seed);

        let mut groups: Vec<ParticleGroup> = (0..GROUP_COUNT)
            .map(|index| ParticleGroup::new(index, &mut rng))
            .collect();

        if let Some(ref name) = args.preset {
            match presets::find(name) {
                Some(preset) => {
                    println!("Preset: {}", preset.name);
                    for (group, overlay) in groups.iter_mut().zip(&preset.groups) {
                        group.apply_preset(overlay, &mut rng);
                    }
                }
                None => {
                    eprintln!("Warning: Unknown preset '{}', using defaults", name);
                    eprintln!("Available presets: {}", presets::names().join(", "));
                }
            }
        }

        let now = Instant::now();
        Ok(Self {
            window: None,
            render_system: None,
            groups,
            noise,
            beat: BeatManager::new(),
            camera: CameraSystem::new(args.orbit),
            audio: None,
            rng,
            audio_input,
            render_config,
            recording_config,
            start_time: now,
            last_frame: now,
            frame_num: 0,
            fps_window_start: now,
            fps_window_frames: 0,
            estimated_fps: 60.0,
        })
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &winit::event_loop::ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &winit::event_loop::ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        let window_attributes = Window::default_attributes()
            .with_title("Audiosphere")
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ));

        let window = match event_loop.create_window(window_attributes) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                eprintln!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let render_system = match pollster::block_on(RenderSystem::new(
            Arc::clone(&window),
            &self.groups,
            self.recording_config.clone(),
        )) {
            Ok(rs) => rs,
            Err(e) => {
                eprintln!("Failed to initialize rendering: {}", e);
                event_loop.exit();
                return;
            }
        };

        // A missing audio device degrades to silence rather than aborting
        match AudioSystem::new(
            self.audio_input,
            FftConfig::default(),
            self.recording_config.as_ref(),
        ) {
            Ok(audio) => self.audio = Some(audio),
            Err(e) => eprintln!("Audio unavailable ({}), running silent", e),
        }

        println!("\nAudiosphere is running!");
        println!("Keys 1-{} toggle groups, ESC quits\n", GROUP_COUNT);

        let now = Instant::now();
        self.start_time = now;
        self.last_frame = now;
        self.fps_window_start = now;

        self.window = Some(window);
        self.render_system = Some(render_system);
    }

    fn window_event(
        &mut self,
        event_loop: &winit::event_loop::ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(code),
                        ..
                    },
                ..
            } => match code {
                KeyCode::Escape => event_loop.exit(),
                KeyCode::Digit1 => self.toggle_group(0),
                KeyCode::Digit2 => self.toggle_group(1),
                KeyCode::Digit3 => self.toggle_group(2),
                KeyCode::Digit4 => self.toggle_group(3),
                KeyCode::Digit5 => self.toggle_group(4),
                _ => {}
            },
            WindowEvent::RedrawRequested => {
                self.render_frame();

                // Recording runs for a fixed frame count, then exits
                if let Some(ref config) = self.recording_config {
                    if self.frame_num >= config.total_frames() {
                        println!("Recording complete: {} frames", self.frame_num);
                        event_loop.exit();
                    }
                }
            }
            _ => {}
        }
    }
}

impl App {
    fn toggle_group(&mut self, index: usize) {
        let group = &mut self.groups[index];
        group.params.enabled = !group.params.enabled;
        println!(
            "Group {}: {}",
            index + 1,
            if group.params.enabled { "on" } else { "off" }
        );
    }

    /// Simulate and render a single frame
    fn render_frame(&mut self) {
        let Some(ref mut render_system) = self.render_system else {
            return;
        };

        let now = Instant::now();
        let delta_time = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        // Rolling frame-rate estimate over fixed windows
        self.fps_window_frames += 1;
        let window_s = now.duration_since(self.fps_window_start).as_secs_f32();
        if window_s >= FPS_WINDOW_S {
            self.estimated_fps = self.fps_window_frames as f32 / window_s;
            self.fps_window_frames = 0;
            self.fps_window_start = now;
        }

        let ctx = FrameContext::new(
            delta_time,
            self.start_time.elapsed().as_secs_f32(),
            self.estimated_fps,
            self.render_config.aspect_ratio(),
        );

        let snapshot = self.audio.as_ref().map(|a| a.snapshot());

        // One wave advance per frame; groups share the impulse
        self.beat.advance(ctx.delta_time);

        let view_proj = self.camera.view_proj_matrix(ctx.elapsed_s, &self.render_config);

        let mut enabled = [false; GROUP_COUNT];
        for group in &mut self.groups {
            sim::step_group(
                group,
                &self.noise,
                &mut self.beat,
                snapshot.as_ref(),
                &ctx,
                &mut self.rng,
            );

            if group.params.enabled {
                enabled[group.index] = true;
                render_system.sync_group(group);

                let mvp = view_proj * Mat4::from_rotation_y(group.rotation_angle);
                render_system.update_group_uniforms(
                    group.index,
                    &PointUniforms::new(
                        mvp,
                        self.render_config.point_alpha,
                        group.params.particle_size,
                        self.render_config.aspect_ratio(),
                    ),
                );
            }
        }

        if let Err(e) = render_system.render(self.frame_num, &enabled) {
            eprintln!("Render error: {:?}", e);
        }
        self.frame_num += 1;
    }
}

fn main() {
    let args = Args::parse();

    if args.list_presets {
        println!("Built-in presets:");
        for name in presets::names() {
            println!("  {}", name);
        }
        return;
    }

    println!("Audiosphere - audio-reactive particle visualizer");
    println!("Initializing systems...\n");

    let mut app = match App::new(&args) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let event_loop = match EventLoop::new() {
        Ok(el) => el,
        Err(e) => {
            eprintln!("Failed to create event loop: {}", e);
            std::process::exit(1);
        }
    };
    let _ = event_loop.run_app(&mut app);
}

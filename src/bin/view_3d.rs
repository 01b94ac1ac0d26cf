//! Desktop viewer for the demo stage.
//!
//! ```bash
//! cargo run --release -- --scale 4
//! ```
//!
//! Arrows / WASD drive, PageUp / PageDown raise and lower the camera.

use std::time::{Duration, Instant};

use anyhow::bail;
use clap::Parser;
use log::LevelFilter;
use minifb::{Key, Scale, Window, WindowOptions};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use varooom_rs::{
    content,
    math::{ANGLE_TURN, Fixed, Point3d},
    renderer::{Color, GbaSprites, ModelHandle, Models, Software, SpriteHandle},
    sim::{
        CollisionPoints, CollisionTarget, MAX_CAMERA_Y, Scene, is_slow_ground,
        player_collision_points,
    },
    world::{CELL_SIZE, GRID_COLUMNS, Sprite3dItem},
};

#[derive(Parser, Debug)]
#[command(about = "Top-down view of the demo stage")]
struct Args {
    /// Window scale factor: 1, 2, 4 or 8.
    #[arg(long, default_value_t = 4)]
    scale: u8,

    /// Target frame rate.
    #[arg(long, default_value_t = 60)]
    fps: usize,

    /// Quit after this many frames.
    #[arg(long)]
    frames: Option<u64>,

    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

const SPEED: i32 = 2;
const TURN_SPEED: i32 = 512;
const LIFT_SPEED: i32 = 2;
const MIN_CAMERA_HEIGHT: i32 = 48;
const CRASH_FRAMES: u32 = 45;
/// Keeps the camera, and every car collision point, inside the stage grid.
const WORLD_MARGIN: i32 = 16;

/// Player car state seen by the collision check.
struct Player {
    points: CollisionPoints,
    crash_frames: u32,
}

impl CollisionTarget for Player {
    fn can_crash(&self) -> bool {
        self.crash_frames == 0
    }

    fn collision_points(&self) -> CollisionPoints {
        self.points.clone()
    }

    fn crash(&mut self, model_index: usize) {
        log::info!("crashed into model {model_index}");
        self.crash_frames = CRASH_FRAMES;
    }
}

fn window_scale(scale: u8) -> anyhow::Result<Scale> {
    Ok(match scale {
        1 => Scale::X1,
        2 => Scale::X2,
        4 => Scale::X4,
        8 => Scale::X8,
        other => bail!("unsupported scale {other}, use 1, 2, 4 or 8"),
    })
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    TermLogger::init(
        args.log_level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )?;

    let stage = content::demo_stage()?;
    let car = content::car()?;
    let explosion = content::explosion_sprite_item();

    let mut scene = Scene::new(&stage);
    let car_handle = scene.models_mut().create_dynamic_model(&car);
    let mut explosion_handle: Option<SpriteHandle> = None;
    let mut player = Player {
        points: CollisionPoints::new(),
        crash_frames: 0,
    };

    let mut hw = GbaSprites::default();
    let mut software = Software::default();

    let options = WindowOptions {
        scale: window_scale(args.scale)?,
        ..WindowOptions::default()
    };
    let mut win = Window::new("varooom", software.width(), software.height(), options)?;
    win.set_target_fps(args.fps);

    let mut acc_time = Duration::ZERO;
    let mut acc_frames = 0usize;
    let mut last_print = Instant::now();
    let mut frames = 0u64;

    while win.is_open() && !win.is_key_down(Key::Escape) {
        if args.frames.is_some_and(|limit| frames >= limit) {
            break;
        }
        let t0 = Instant::now();

        /* input ----------------------------------------------------------- */
        let camera = scene.camera_mut();
        let down = |keys: &[Key]| keys.iter().any(|&k| win.is_key_down(k));

        if player.crash_frames == 0 {
            let slow = is_slow_ground(&stage, camera.position());
            let speed = Fixed::from_int(if slow { SPEED / 2 } else { SPEED });
            let mut forward = Fixed::ZERO;
            let mut side = Fixed::ZERO;
            if down(&[Key::Up, Key::W]) {
                forward += speed;
            }
            if down(&[Key::Down, Key::S]) {
                forward -= speed;
            }
            if down(&[Key::A]) {
                side -= speed;
            }
            if down(&[Key::D]) {
                side += speed;
            }
            camera.step(forward, side);
        }
        if down(&[Key::Left]) {
            camera.turn(Fixed::from_int(TURN_SPEED));
        }
        if down(&[Key::Right]) {
            camera.turn(Fixed::from_int(-TURN_SPEED));
        }
        let height = camera.position().y;
        if down(&[Key::PageUp]) && height < Fixed::from_int(MAX_CAMERA_Y - LIFT_SPEED) {
            camera.lift(Fixed::from_int(LIFT_SPEED));
        }
        if down(&[Key::PageDown]) && height > Fixed::from_int(MIN_CAMERA_HEIGHT) {
            camera.lift(Fixed::from_int(-LIFT_SPEED));
        }
        let mut position = *camera.position();
        let world_max = Fixed::from_int(GRID_COLUMNS as i32 * CELL_SIZE - WORLD_MARGIN);
        let world_min = Fixed::from_int(WORLD_MARGIN);
        position.x = position.x.clamp(world_min, world_max);
        position.z = position.z.clamp(world_min, world_max);
        camera.set_position(position);
        let heading = Fixed::from_int(ANGLE_TURN) - camera.phi();

        /* player car ------------------------------------------------------ */
        let models = scene.models_mut();
        let car_model = models.dynamic_model_mut(car_handle);
        car_model.set_position(Point3d::new(position.x, Fixed::ZERO, position.z));
        car_model.set_theta(heading);
        player.points = player_collision_points(models.dynamic_model(car_handle));

        update_crash(&mut player, models, car_handle, &mut explosion_handle, &explosion);

        /* frame ----------------------------------------------------------- */
        scene.update(&mut hw, Some(&mut player));

        let mut shown = Ok(());
        software.draw_frame(scene.models().shape_groups(), |fb, w, h| {
            acc_time += t0.elapsed();
            acc_frames += 1;
            shown = win.update_with_buffer(fb, w, h);
        });
        shown?;
        frames += 1;

        if last_print.elapsed() >= Duration::from_secs(3) {
            let avg_ms = acc_time.as_secs_f64() * 1000.0 / acc_frames as f64;
            log::info!(
                "avg frame: {avg_ms:.2} ms ({:.1} FPS), {} primitives",
                1000.0 / avg_ms,
                scene.models().rendered().len()
            );
            acc_time = Duration::ZERO;
            acc_frames = 0;
            last_print = Instant::now();
        }
    }
    Ok(())
}

/// Crash feedback: a red fade and an explosion billboard that shrinks
/// away over `CRASH_FRAMES`.
fn update_crash<'a>(
    player: &mut Player,
    models: &mut Models<'a>,
    car_handle: ModelHandle,
    explosion_handle: &mut Option<SpriteHandle>,
    explosion: &'a Sprite3dItem,
) {
    if player.crash_frames == 0 {
        if let Some(handle) = explosion_handle.take() {
            models.destroy_sprite(handle);
            models.set_fade(Color::default(), Fixed::ZERO);
        }
        return;
    }

    let handle = *explosion_handle.get_or_insert_with(|| models.create_sprite(explosion));
    let remaining = Fixed::from_int(player.crash_frames as i32) / CRASH_FRAMES as i32;
    let car_position = *models.dynamic_model(car_handle).position();
    let sprite = models.sprite_mut(handle);
    sprite.set_position(car_position + Point3d::from_ints(0, 8, 0));
    sprite.set_scale(remaining.max(Fixed::from_f64(0.125)));
    models.set_fade(Color::new(31, 4, 0), remaining / 2);
    player.crash_frames -= 1;
}

extern crate nannou;
use std::{error::Error, ops::RangeInclusive};

use boids_core::{
    cadence::{Cadence, TickToken},
    options::{ParamChange, SimulationParams},
    run_headless,
    simulation::{Simulation, SimulationError},
};
use clap_serde_derive::clap::Parser;
use nannou::prelude::*;
use nannou_egui::{egui, Egui};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

mod cliargs;
mod render;
use cliargs::{Args, Config};
use render::{Drawable, Surface};

/// Upper end of the population slider unless the launch value is larger.
const POPULATION_SLIDER_MAX: usize = 5000;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("boids_core=info,boids_viewer=info")),
        )
        .init();

    let mut args = Args::parse();
    let config = cliargs::load(&mut args)?;

    if config.headless_ticks > 0 {
        let seed = config.seed();
        info!(ticks = config.headless_ticks, seed, "running headless");
        let data = run_headless(config.headless_ticks, &config.params(), seed, config.sample_rate)?;
        println!("{}", serde_json::to_string(&data)?);
        return Ok(());
    }

    nannou::app(model).update(update).run();
    Ok(())
}

struct ControlsState {
    execution_paused: bool,
    controls_open: bool,
}

struct Model {
    egui: Egui,
    sim: Simulation,
    /// what the controls edit, weights as entered
    params: SimulationParams,
    cadence: Cadence,
    token: Option<TickToken>,
    /// population slider bounds, wide enough for the launch value
    population_range: RangeInclusive<usize>,
    control_state: ControlsState,
}

fn model(app: &App) -> Model {
    let mut args = Args::parse();
    let config = cliargs::load(&mut args).unwrap_or_else(|err| {
        error!(%err, "could not read the config file, using defaults and flags");
        Config::from(&mut args.config)
    });
    let params = config.params();
    let seed = config.seed();
    info!(population = params.population, seed, "opening window");

    let main_window = app
        .new_window()
        .key_pressed(key_pressed)
        .size(params.domain.width as u32, params.domain.height as u32)
        .title("boids flocking")
        .raw_event(raw_window_event)
        .view(view)
        .build()
        .unwrap();

    let window = app.window(main_window).unwrap();

    let mut sim = Simulation::new(seed);
    let token = match sim.setup(&applied(&params)) {
        Ok(token) => Some(token),
        Err(err) => {
            error!(%err, "could not start the simulation");
            None
        }
    };

    let cadence = Cadence::new(params.refresh_rate).unwrap_or_else(|err| {
        warn!(%err, "falling back to the default cadence");
        Cadence::default()
    });

    Model {
        egui: Egui::from_window(&window),
        sim,
        population_range: population_range(params.population),
        params,
        cadence,
        token,
        control_state: ControlsState {
            execution_paused: false,
            controls_open: false,
        },
    }
}

/// The parameters the core runs with: the UI presents the weights normalized,
/// so that is what gets applied.
fn applied(params: &SimulationParams) -> SimulationParams {
    SimulationParams {
        weights: params.weights.normalized(),
        ..params.clone()
    }
}

fn population_range(launch: usize) -> RangeInclusive<usize> {
    0..=launch.max(POPULATION_SLIDER_MAX)
}

fn update(_app: &App, model: &mut Model, update: Update) {
    let Model {
        ref mut egui,
        ref mut sim,
        ref mut params,
        ref mut cadence,
        ref mut token,
        ref population_range,
        ref mut control_state,
    } = *model;

    // update controls UI
    egui.set_elapsed_time(update.since_start);
    let ctx = egui.begin_frame();
    let mut changed = false;
    let paused = control_state.execution_paused;

    egui::Window::new("controls")
        .default_size(egui::vec2(0.0, 200.0))
        .open(&mut control_state.controls_open)
        .show(&ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("population");
                changed |= ui
                    .add(egui::Slider::new(&mut params.population, population_range.clone()))
                    .changed();
            });

            ui.horizontal(|ui| {
                ui.label("radius");
                changed |= ui
                    .add(egui::Slider::new(&mut params.neighbourhood_radius, 5.0..=200.0))
                    .changed();
            });

            ui.separator();

            ui.horizontal(|ui| {
                ui.label("max speed");
                changed |= ui
                    .add(egui::Slider::new(&mut params.max_speed, 0.0..=1000.0))
                    .changed();
            });

            ui.horizontal(|ui| {
                ui.label("max acceleration");
                changed |= ui
                    .add(egui::Slider::new(&mut params.max_acceleration, 0.0..=1000.0))
                    .changed();
            });

            ui.horizontal(|ui| {
                ui.label("decay");
                changed |= ui
                    .add(egui::Slider::new(&mut params.acceleration_decay, 0.0..=1.0))
                    .changed();
            });

            ui.separator();

            ui.horizontal(|ui| {
                ui.label("cohesion");
                changed |= ui
                    .add(egui::Slider::new(&mut params.weights.cohesion, 0.0..=1.0))
                    .changed();
            });

            ui.horizontal(|ui| {
                ui.label("alignment");
                changed |= ui
                    .add(egui::Slider::new(&mut params.weights.alignment, 0.0..=1.0))
                    .changed();
            });

            ui.horizontal(|ui| {
                ui.label("separation");
                changed |= ui
                    .add(egui::Slider::new(&mut params.weights.separation, 0.0..=1.0))
                    .changed();
            });

            let w = params.weights.normalized();
            ui.label(format!(
                "applied weights: {c:.2} / {a:.2} / {s:.2}",
                c = w.cohesion,
                a = w.alignment,
                s = w.separation
            ));

            ui.separator();

            ui.label(format!("No. boids: {n}", n = sim.snapshot().len()));
            ui.label(format!("No. ticks: {t}", t = sim.ticks()));
            if paused {
                ui.label("paused");
            }
        });

    if changed {
        match sim.reconfigure(&applied(params)) {
            Ok(ParamChange::Structural) => {
                *token = sim.token().cloned();
                cadence.reset(update.since_start);
            }
            Ok(_) => {}
            Err(SimulationError::NotRunning) => {
                // the launch parameters were rejected, try again with the new ones
                if let Ok(t) = sim.setup(&applied(params)) {
                    *token = Some(t);
                    cadence.reset(update.since_start);
                }
            }
            Err(err) => warn!(%err, "parameter update ignored"),
        }
    }

    // update model
    if control_state.execution_paused {
        return;
    }

    let due = match token {
        Some(t) if t.is_active() => cadence.poll(update.since_start),
        _ => false,
    };
    if due {
        if let Err(err) = sim.tick() {
            warn!(%err, "tick skipped");
        }
    }
}

fn raw_window_event(_app: &App, model: &mut Model, event: &nannou::winit::event::WindowEvent) {
    model.egui.handle_raw_event(event);
}

fn key_pressed(app: &App, model: &mut Model, key: Key) {
    if key == Key::Space {
        // pause the whole simulation
        model.control_state.execution_paused = !model.control_state.execution_paused
    } else if key == Key::C {
        // show/hide controls
        model.control_state.controls_open = !model.control_state.controls_open
    } else if key == Key::R {
        // fresh population, same parameters
        match model.sim.restart() {
            Ok(token) => {
                debug!(generation = token.generation(), "restarted");
                model.token = Some(token);
                model.cadence.reset(app.duration.since_start);
            }
            Err(err) => warn!(%err, "restart failed"),
        }
    }
}

fn view(app: &App, model: &Model, frame: Frame) {
    let draw = app.draw();
    draw.background().color(WHITE);

    if let Some(params) = model.sim.params() {
        let surface = Surface::new(app.window_rect(), &params.domain);
        model.sim.snapshot().draw(&draw, &surface);
    }

    if let Err(err) = draw.to_frame(app, &frame) {
        warn!(?err, "could not draw the flock");
    }
    if let Err(err) = model.egui.draw_to_frame(&frame) {
        warn!(?err, "could not draw the controls");
    }
}

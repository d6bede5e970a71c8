//! Delivers a short scene in the terminal, one character at a time.
//!
//! Lines move on by themselves. Run with `cargo run --example terminal`.
use std::{io::Write, sync::Arc, time::Duration};

use bevy::{
    app::{AppExit, ScheduleRunnerPlugin},
    prelude::*,
};
use bevy_typewriter::prelude::*;

/// The lines still to deliver.
#[derive(Resource)]
struct Script(Vec<MarkupParseResult>);

/// The settings the deliverer is built with.
#[derive(Resource)]
struct SettingsHandle(Handle<TypewriterSettings>);

/// How much of the surface text was printed so far.
#[derive(Component, Default)]
struct Printed {
    /// The line being printed.
    text: String,
    /// Characters of it already printed.
    count: usize,
}

/// Prints a character's expression changes.
struct Face(String);

impl ExpressionTarget for Face {
    fn set_facial_expression(&mut self, emotion: &str) {
        print!(" ({} looks {}) ", self.0, emotion);
    }
}

/// Runs the scene.
fn main() {
    let mut lines: Vec<MarkupParseResult> =
        serde_ron::from_str(include_str!("../assets/lines/intro.ron"))
            .expect("the script should be valid RON");
    lines.reverse();

    App::new()
        .add_plugins((
            MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
                1.0 / 60.0,
            ))),
            AssetPlugin::default(),
            TypewriterPlugin,
        ))
        .insert_resource(Script(lines))
        .add_systems(Startup, load_settings)
        .add_systems(
            Update,
            (spawn_deliverer, next_line, print_line)
                .chain()
                .after(TypewriterSet),
        )
        .run();
}

/// Starts loading the settings.
fn load_settings(mut commands: Commands, server: Res<AssetServer>) {
    let handle = server.load("settings/classic.typewriter.ron");
    commands.insert_resource(SettingsHandle(handle));
}

/// Spawns the deliverer once the settings are loaded and sends the first line.
fn spawn_deliverer(
    mut commands: Commands,
    handle: Res<SettingsHandle>,
    settings: Res<Assets<TypewriterSettings>>,
    ticker: Res<FrameTicker>,
    deliverers: Query<(), With<LineDeliverer>>,
    mut script: ResMut<Script>,
    mut requests: EventWriter<DeliverLineRequest>,
) {
    if !deliverers.is_empty() {
        return;
    }
    let Some(settings) = settings.get(&handle.0) else {
        return;
    };

    let surface = TextSurface::default();
    let presenter = LinePresenter::from_settings(Arc::new(ticker.clone()), settings)
        .with_surface(surface.clone())
        .with_handler(EmotionHandler::default().with_character("Alice", Face("Alice".into())));
    let deliverer = commands
        .spawn((LineDelivererBundle::new(presenter, surface), Printed::default()))
        .id();

    if let Some(line) = script.0.pop() {
        requests.send(DeliverLineRequest::new(deliverer, line));
    }
}

/// Sends the next line once the previous one is dismissed, and quits after the last.
fn next_line(
    mut dismissed: EventReader<LineDismissedEvent>,
    mut script: ResMut<Script>,
    mut requests: EventWriter<DeliverLineRequest>,
    mut exit: EventWriter<AppExit>,
) {
    for LineDismissedEvent(deliverer) in dismissed.read() {
        match script.0.pop() {
            Some(line) => requests.send(DeliverLineRequest::new(*deliverer, line)),
            None => {
                println!();
                exit.send(AppExit);
            }
        }
    }
}

/// Prints the characters revealed since the last frame.
fn print_line(mut surfaces: Query<(&TextSurface, &mut Printed)>) {
    for (surface, mut printed) in &mut surfaces {
        let text = surface.text();
        if text != printed.text {
            if !printed.text.is_empty() {
                println!();
            }
            printed.text = text;
            printed.count = 0;
        }
        let visible = surface.visible_characters();
        if visible > printed.count {
            let new: String = printed
                .text
                .chars()
                .skip(printed.count)
                .take(visible - printed.count)
                .collect();
            print!("{}", new);
            let _ = std::io::stdout().flush();
            printed.count = visible;
        }
    }
}

use std::{path::PathBuf, time::Instant};

use clap::{Parser, Subcommand};
use timeline_editor_core::{
    Cue, DropPayload, EditorConfig, Result, SaveStatus, TimelineEditor, TimelineError, Viewport,
};
use tracing_subscriber::EnvFilter;

mod store;

use store::FileStore;

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::default(),
    };

    let mut store = FileStore::new(&cli.store);
    let viewport = Viewport {
        width: cli.viewport_width,
        height: 240.0,
        ..Default::default()
    };
    let mut editor = TimelineEditor::load(&cli.project, &mut store, config, viewport);

    match cli.command {
        Commands::Inspect => {
            print_summary(&editor);
            return Ok(());
        }
        Commands::Feed => {
            let feed = editor.take_feed().unwrap_or_default();
            println!("{}", serde_json::to_string_pretty(&feed)?);
            return Ok(());
        }
        Commands::Split { id, at } => {
            editor.edit(Instant::now(), |timeline| timeline.split(&id, at))?;
        }
        Commands::Delete { ids } => {
            let removed = editor.edit(Instant::now(), |timeline| {
                Ok(timeline.delete_many(ids.iter().map(String::as_str)))
            })?;
            tracing::info!(removed = removed.len(), "deleted clips");
        }
        Commands::Reorder { id, center } => {
            let index = editor.edit(Instant::now(), |timeline| timeline.reorder_program(&id, center))?;
            tracing::info!(%id, index, "moved program clip");
        }
        Commands::Resize { id, duration } => {
            editor.edit(Instant::now(), |timeline| {
                let clip = timeline
                    .find(&id)
                    .cloned()
                    .ok_or_else(|| TimelineError::ClipNotFound(id.clone()))?;
                let duration = timeline_editor_core::coords::quantize(duration, timeline.fps());
                timeline.set_geometry(&id, clip.start, duration, clip.source_in)
            })?;
        }
        Commands::Drop { payload, at } => {
            let payload: DropPayload = serde_json::from_str(&payload)?;
            let id = editor.edit(Instant::now(), |timeline| {
                timeline
                    .drop_asset(payload, at)
                    .ok_or_else(|| TimelineError::msg("drop payload was discarded"))
            })?;
            tracing::info!(%id, "placed dropped asset");
        }
        Commands::Cues { file } => {
            let cues: Vec<Cue> = serde_json::from_str(&std::fs::read_to_string(&file)?)?;
            let ids = editor.insert_cues(&cues, Instant::now());
            tracing::info!(inserted = ids.len(), skipped = cues.len() - ids.len(), "imported cues");
        }
    }

    match editor.flush(Instant::now(), &mut store) {
        Some(SaveStatus::Failed { error }) => return Err(error),
        Some(status) => tracing::info!(revision = status.revision(), "timeline stored"),
        None => tracing::info!("nothing to store"),
    }
    print_summary(&editor);
    Ok(())
}

fn print_summary(editor: &TimelineEditor) {
    let timeline = editor.timeline();
    println!(
        "revision {} · {} fps · {:.3}s",
        timeline.revision(),
        timeline.fps(),
        timeline.total_duration()
    );
    for lane in timeline.lanes() {
        if lane.is_empty() {
            continue;
        }
        println!("{:?}", lane.kind());
        for clip in lane.clips() {
            println!(
                "  {:<16} {:>9.3} {:>9.3}  {}",
                clip.id,
                clip.start,
                clip.end(),
                clip.text().unwrap_or(&clip.label)
            );
        }
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Edit stored timelines from the command line", long_about = None)]
struct Cli {
    /// Directory holding one `<project>.json` timeline per project.
    #[arg(short, long, default_value = ".")]
    store: PathBuf,
    /// Project whose timeline is edited.
    #[arg(short, long)]
    project: String,
    /// Editor configuration file (JSON).
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Viewport width used to derive zoom bounds.
    #[arg(long, default_value_t = 1280.0)]
    viewport_width: f64,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print every lane and its clips.
    Inspect,
    /// Print the compositor feed as JSON.
    Feed,
    /// Split a clip at a timeline time in seconds.
    Split { id: String, at: f64 },
    /// Delete one or more clips.
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Move a program clip to the boundary nearest `center` seconds.
    Reorder { id: String, center: f64 },
    /// Change a clip's duration, keeping its start.
    Resize { id: String, duration: f64 },
    /// Place an asset described by a JSON drop payload.
    Drop {
        payload: String,
        /// Timeline time in seconds.
        #[arg(long, default_value_t = 0.0)]
        at: f64,
    },
    /// Import caption cues from a JSON file.
    Cues { file: PathBuf },
}

//! Headless line-driven front end.
//!
//! Usage: `kinshu-tally [config.yaml]`, then one command per line on stdin:
//!
//! ```text
//! tap jpy-1000          open the keypad on a denomination
//! key 3 + 2 Enter       press keypad keys by label
//! dismiss               close the keypad without committing
//! notes                 list notes
//! new CNY Safe          create a note
//! switch <note-id>      make a note active
//! delete <note-id>      delete a note
//! save [memo]           record a save point
//! history               list save points of the active note
//! restore <point-id>    restore counts from a save point
//! reset                 clear the active note's counts
//! export <dir>          write a CSV summary
//! backup <dir>          write a JSON backup
//! import <file>         replace all notes with a backup (asks first)
//! dark on|off           toggle the dark mode preference
//! quit
//! ```

use anyhow::{Context, Result};
use log::{error, info};
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use kinshu_tally::backend::logging;
use kinshu_tally::{
    export_in_background, initialize_backend, BackupService, CreateNoteCommand,
    CsvSummaryExporter, Currency, HeadlessSurface, ImportOutcome, SummaryExporter, TallyConfig,
    TallySession,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => TallyConfig::load(&path)?,
        None => TallyConfig::default(),
    };
    logging::init(&config.log_level)?;

    let app = initialize_backend(config).context("Failed to initialize backend")?;
    let preferences = app.preferences.clone();
    let mut session = app.into_session(HeadlessSurface::default());
    let backups = BackupService::new();

    print_sheet(&session);
    let mut reported_errors = 0;

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    while let Some(line) = lines.next() {
        let line = line?;
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            continue;
        };
        let rest: Vec<&str> = words.collect();

        let result: Result<()> = match command {
            "tap" => {
                for id in &rest {
                    if !session.tap_cell(id) {
                        println!("cannot edit {}", id);
                    }
                }
                if let Some(caption) = session.keypad_caption() {
                    println!("{}", caption);
                }
                Ok(())
            }
            "key" => rest.iter().try_for_each(|label| -> Result<()> {
                session.press_label(label)?;
                if let Some(input) = session.keypad().input() {
                    println!("> {}", input);
                }
                Ok(())
            }),
            "dismiss" => {
                session.dismiss_keypad();
                Ok(())
            }
            "notes" => {
                let current = session.store().current_note_id().to_string();
                for note in session.store().notes() {
                    let marker = if note.id == current { "*" } else { " " };
                    println!("{} {} {} ({})", marker, note.id, note.name, note.currency);
                }
                Ok(())
            }
            "new" => {
                let currency: Currency = rest
                    .first()
                    .copied()
                    .unwrap_or("JPY")
                    .parse()
                    .map_err(anyhow::Error::msg)?;
                let name = rest.get(1..).map(|words| words.join(" ")).unwrap_or_default();
                let note = session.create_note(CreateNoteCommand::new(name, currency))?;
                println!("created {} {}", note.id, note.name);
                Ok(())
            }
            "switch" => note_command(&rest, |id| Ok(session.switch_note(id)?)),
            "delete" => note_command(&rest, |id| Ok(session.delete_note(id)?)),
            "save" => {
                if let Some(point) = session.save_checkpoint(&rest.join(" "))? {
                    println!("saved {} total {}", point.id, point.total.normalize());
                }
                Ok(())
            }
            "history" => {
                for point in &session.store().current_note().saved_points {
                    println!(
                        "{} {} {} total {}",
                        point.id,
                        point.timestamp.format("%Y-%m-%d %H:%M"),
                        point.memo,
                        point.total.normalize()
                    );
                }
                Ok(())
            }
            "restore" => note_command(&rest, |id| Ok(session.restore_saved_point(id)?)),
            "reset" => Ok(session.reset_counts()?),
            "export" => {
                let directory = rest.first().copied().unwrap_or(".");
                let exporter: Arc<dyn SummaryExporter> = Arc::new(CsvSummaryExporter::new(directory));
                export_in_background(exporter, session.export_snapshot(), |result| match result {
                    Ok(path) => println!("exported {}", path.display()),
                    Err(e) => println!("export failed: {}", e),
                })
                .await?;
                Ok(())
            }
            "backup" => {
                let directory = rest.first().copied().unwrap_or(".");
                let path = backups.export_backup(session.store_mut(), Path::new(directory))?;
                println!("backed up to {}", path.display());
                Ok(())
            }
            "import" => match rest.first() {
                Some(path) => {
                    let outcome = backups.import_backup(session.store_mut(), Path::new(path), |preview| {
                        print!("replace all notes with {} note(s)? [y/N] ", preview.note_count);
                        let _ = io::stdout().flush();
                        matches!(lines.next(), Some(Ok(answer)) if answer.trim().eq_ignore_ascii_case("y"))
                    })?;
                    if let ImportOutcome::Imported { note_count } = outcome {
                        println!("imported {} note(s)", note_count);
                    }
                    session.render();
                    Ok(())
                }
                None => {
                    println!("usage: import <file>");
                    Ok(())
                }
            },
            "dark" => {
                let enabled = rest.first().map_or(false, |v| *v == "on");
                let updated = preferences.set_dark_mode(enabled)?;
                println!("dark mode {}", if updated.dark_mode { "on" } else { "off" });
                Ok(())
            }
            "quit" | "exit" => break,
            other => {
                println!("unknown command: {}", other);
                Ok(())
            }
        };

        session.report_save_failure();
        for message in &session.surface().save_errors()[reported_errors..] {
            println!("{}", message);
        }
        reported_errors = session.surface().save_errors().len();

        match result {
            Ok(()) => print_sheet(&session),
            Err(e) => {
                error!("{} failed: {:#}", command, e);
                println!("error: {:#}", e);
            }
        }
    }

    session.store_mut().flush_now()?;
    info!("Goodbye");
    Ok(())
}

fn note_command<F>(args: &[&str], run: F) -> Result<()>
where
    F: FnOnce(&str) -> Result<bool>,
{
    match args.first() {
        Some(id) => {
            if !run(id)? {
                println!("not found: {}", id);
            }
            Ok(())
        }
        None => {
            println!("missing id");
            Ok(())
        }
    }
}

fn print_sheet(session: &TallySession<HeadlessSurface>) {
    let surface = session.surface();
    let note = session.store().current_note();
    let unit = note.currency.unit();

    println!("[{}] {}", note.name, note.currency);
    for cell in surface.cells() {
        if cell.count != "0" {
            println!("  {:<8} {}", cell.label, cell.count);
        }
    }
    let summary = surface.summary();
    println!(
        "  total {}{}  bills {}  coins {}",
        summary.total.normalize(),
        unit,
        summary.bill_count.normalize(),
        summary.coin_count.normalize()
    );
}

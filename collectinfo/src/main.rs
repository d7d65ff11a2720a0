use rayon::prelude::*;
use smfread::{
    read_track_header, Cursor, EventIter, EventKind, Header, MetaMessage, Smf, Tempo, Timing,
};
use std::{
    env,
    error::Error,
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
};

type CollectResult = Result<String, Box<dyn Error + Send + Sync>>;
type Collector = (&'static str, fn(&[u8], &Smf) -> CollectResult);

const MIDI_DIR: &str = "test-asset";

const MIDI_EXT: &[&str] = &["mid", "midi"];

const INFO_COLLECTORS: &[Collector] = &[("summary", summary), ("tempo_map", tempo_map)];

fn summary(_raw: &[u8], smf: &Smf) -> CollectResult {
    let mut out = String::new();
    let timing = match smf.header.timing {
        Timing::Metrical(tpb) => format!("{} ticks/beat", tpb),
        Timing::Timecode {
            frames,
            ticks_per_frame,
        } => match smf.header.timing.fps() {
            Some(fps) => format!("{} fps, {} ticks/frame", fps.as_int(), ticks_per_frame),
            None => format!("raw frames {}, {} ticks/frame", frames, ticks_per_frame),
        },
    };
    writeln!(
        out,
        "format {} / {} / {} of {} declared tracks",
        smf.header.format.as_int(),
        timing,
        smf.tracks.len(),
        smf.header.track_count,
    )?;
    for (idx, track) in smf.tracks.iter().enumerate() {
        let name = track
            .track_name
            .first()
            .map(|name| name.text.as_str())
            .unwrap_or("");
        writeln!(
            out,
            "        track {} \"{}\": {} notes, {} program changes, {} other channel events, {} records total",
            idx,
            name,
            track.notes.len(),
            track.program_changes.len(),
            track.one_byte_events.len() + track.two_byte_events.len(),
            track.event_count(),
        )?;
    }
    Ok(out)
}

/// Absolute tick of every tempo change.
///
/// Deltas are relative to the previous event of any kind, including the ones the categorized
/// tracks drop, so ticks are accumulated over the raw event stream of each track.
fn tempo_map(raw: &[u8], _smf: &Smf) -> CollectResult {
    let mut out = String::new();
    let mut cursor = Cursor::new(raw);
    let header = Header::read(&mut cursor)?;
    for idx in 0..header.track_count {
        if !read_track_header(&mut cursor)? {
            break;
        }
        let mut tick = 0u64;
        for ev in EventIter::new(&mut cursor) {
            let ev = ev?;
            tick += u64::from(ev.delta);
            if let EventKind::Meta(MetaMessage::Tempo(tempo)) = ev.kind {
                let bpm = Tempo { delta: ev.delta, tempo }
                    .beats_per_minute()
                    .unwrap_or(0.0);
                writeln!(out, "track {}: tick {} -> {:.2} bpm", idx, tick, bpm)?;
            }
        }
    }
    if out.is_empty() {
        out.push_str("no tempo changes\n");
    }
    Ok(out)
}

fn list_midis(dir: &Path) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    let mut midis = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if MIDI_EXT
            .iter()
            .any(|ext| path.extension() == Some(ext.as_ref()))
        {
            midis.push(path);
        }
    }
    midis.sort();
    Ok(midis)
}

fn collect_file(path: &Path, collectors: &[&Collector]) -> String {
    let mut out = format!("collecting info about file \"{}\"\n", path.display());
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(err) => return out + &format!("  failed to read file ({})\n", err),
    };
    let smf = match Smf::parse(&data) {
        Ok(smf) => smf,
        Err(err) => return out + &format!("  not a readable midi file ({})\n", err),
    };
    for &&(name, collect) in collectors {
        match collect(&data, &smf) {
            Ok(info) => {
                out.push_str(&format!("  {}: ", name));
                out.push_str(&info);
            }
            Err(err) => out.push_str(&format!("  {}: collector error ({})\n", name, err)),
        }
    }
    out
}

fn main() {
    env_logger::init();

    let midi_filter = env::args().nth(1).unwrap_or_default().to_lowercase();
    let info_filter = env::args().nth(2).unwrap_or_default().to_lowercase();
    let midi_dir = env::args().nth(3).unwrap_or_else(|| MIDI_DIR.to_string());

    let collectors = INFO_COLLECTORS
        .iter()
        .filter(|(name, _)| name.contains(&info_filter))
        .collect::<Vec<_>>();
    if collectors.is_empty() {
        eprintln!("no info collectors match the pattern \"{}\"", info_filter);
        eprint!("available info collectors: ");
        for (i, (name, _)) in INFO_COLLECTORS.iter().enumerate() {
            if i > 0 {
                eprint!(", ");
            }
            eprint!("{}", name);
        }
        eprintln!();
        return;
    }

    let unfiltered_midis = match list_midis(midi_dir.as_ref()) {
        Ok(midis) => midis,
        Err(err) => {
            eprintln!("failed to list \"{}\": {}", midi_dir, err);
            return;
        }
    };
    let midis = unfiltered_midis
        .iter()
        .filter(|midi| {
            midi.file_name()
                .and_then(|name| name.to_str())
                .map(|name| name.to_lowercase().contains(&midi_filter))
                .unwrap_or(false)
        })
        .collect::<Vec<_>>();
    if midis.is_empty() {
        eprintln!("no midi files match the pattern \"{}\"", midi_filter);
        eprintln!("available midi files:");
        for file in unfiltered_midis.iter() {
            eprintln!("  {}", file.display());
        }
        return;
    }

    //Parse files in parallel, each file on its own thread
    log::debug!("collecting info about {} files", midis.len());
    let reports = midis
        .par_iter()
        .map(|midi| collect_file(midi, &collectors))
        .collect::<Vec<_>>();
    for report in reports {
        eprintln!("{}", report);
    }
}

// Plain-text rendering of rankings, the user's roster and scarcity.

use std::fmt::Write;

use crate::draft::state::DraftState;
use crate::valuation::baseline::PlayerWithCalcs;
use crate::valuation::recommend::RecommendationsWeights;
use crate::valuation::scarcity::PositionDropoff;

const NAME_WIDTH: usize = 26;

/// Format an optional figure, showing "-" when absent.
fn opt(v: Option<f64>) -> String {
    v.map_or_else(|| "-".to_string(), |v| format!("{v:.1}"))
}

/// Truncate to `width` characters.
fn clip(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        s.chars().take(width.saturating_sub(1)).chain(['~']).collect()
    }
}

/// Ranking table. Each row is `(overall rank, player)`.
pub fn rankings(rows: &[(usize, &PlayerWithCalcs)]) -> String {
    if rows.is_empty() {
        return "No players match.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>4}  {:<width$} {:<3} {:<4} {:>3} {:>6} {:>6} {:>6} {:>5} {:>7}",
        "#",
        "Player",
        "Pos",
        "Team",
        "Age",
        "Proj",
        "VOR",
        "dTeam",
        "Scar",
        "Score",
        width = NAME_WIDTH
    );
    for (rank, p) in rows {
        let marker = if p.would_start { "*" } else { " " };
        let _ = writeln!(
            out,
            "{:>4}{} {:<width$} {:<3} {:<4} {:>3} {:>6.1} {:>6} {:>6.1} {:>5.1} {:>7.2}",
            rank,
            marker,
            clip(p.name(), NAME_WIDTH),
            p.position().display_str(),
            p.player.team.as_deref().unwrap_or(""),
            p.player.age.map_or_else(|| "-".to_string(), |a| a.to_string()),
            p.proj_pts(),
            opt(p.vor),
            p.delta,
            p.scarcity,
            p.score,
            width = NAME_WIDTH
        );
    }
    out.push_str("  (* would start)\n");
    out
}

/// One-line draft status header.
pub fn status_line(state: &DraftState, league_size: usize, available: usize) -> String {
    let total = state.roster_config().total_draft_picks(league_size);
    let taken = state.taken_count();
    let pct = if total == 0 {
        100.0
    } else {
        (taken as f64 / total as f64 * 100.0).min(100.0)
    };
    let mut line = format!(
        "Picks made: {taken}/{total} ({pct:.0}%)  |  My players: {}  |  Available: {available}",
        state.my_player_names().len()
    );
    if let Some((name, status)) = state.taken().last() {
        let _ = write!(line, "  |  Last: {name} ({})", status.label());
    }
    line.push('\n');
    line
}

/// The user's roster, bucket by bucket, with fill counts.
pub fn roster(state: &DraftState) -> String {
    let config = state.roster_config();
    let mut out = String::new();
    for slot in config.slots() {
        let names = state.slot_names(slot);
        let listed = if names.is_empty() {
            "-".to_string()
        } else {
            names.join(", ")
        };
        let _ = writeln!(
            out,
            "{:<6} {}/{}  {}",
            slot.key(),
            names.len(),
            config.capacity(slot),
            listed
        );
    }
    out
}

/// Position drop-off overview, steepest first.
pub fn dropoffs(entries: &[PositionDropoff]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<4} {:>5} {:>8} {:>9} {:>8}",
        "Pos", "Avail", "Top", "Next3avg", "Dropoff"
    );
    for e in entries {
        let _ = writeln!(
            out,
            "{:<4} {:>5} {:>8.1} {:>9.1} {:>8.1}",
            e.position.display_str(),
            e.available,
            e.top_proj,
            e.next_tier_avg,
            e.dropoff
        );
    }
    out
}

pub fn weights(w: &RecommendationsWeights) -> String {
    format!(
        "Weights: delta={:.2} vor={:.2} scarcity={:.2} bench_boost={:.2}\n",
        w.w_delta, w.w_vor, w.w_scarcity, w.bench_depth_boost
    )
}

pub fn help() -> &'static str {
    "\
Commands:
  mine <name>         draft a player to your team        (m)
  gone <name>         mark a player taken by someone else (g)
  undo                revert the most recent pick         (u)
  top [n]             show the top n recommendations      (t)
  pos <POS|ALL>       filter the view by position         (p)
  find [text]         filter by player/team text; no text clears (f)
  roster              show your roster                    (r)
  scarcity            show positional drop-offs           (s)
  weights [d v s b]   show or set delta/VOR/scarcity weights and bench boost (w)
  save <path>         write the draft state to a JSON file
  load <path>         read the draft state from a JSON file
  reset               clear every pick and start a new draft
  help                this text                           (?)
  quit                exit                                (q)
"
}

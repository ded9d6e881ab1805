// AI
//! 📊 progress.rs — "Are we there yet?" — every bulk load, every time, forever.
//!
//! 🚀 Rows written, rows per second, chunks so far, and how long until we're done.
//! A progress bar plus a table so comfy it has lumbar support.
//!
//! ⚠️  Warning: Watching this progress bar will not make it go faster.
//!
//! 🦆 The duck has nothing to do with this module. It's just vibing.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets::NOTHING};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// 🔢 Formats a number with commas for the 3 people in the audience who like readability.
/// "1000000 rows" → "1,000,000 rows" — you're welcome, eyes.
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

/// ⏱️ Formats a Duration into MM:SS or HH:MM:SS.
/// If it shows HH:MM:SS, you should probably call your mom. It's been a while.
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// 📡 A snapshot of throughput at any given moment.
struct Rates {
    rows_per_sec: f64,
    chunks_per_sec: f64,
}

/// 📊 The brains behind the progress display. Tracks rows, chunks, rates, and your sanity.
///
/// Uses a sliding 5-second window for rate calculations so spikes don't scare you.
///
/// # Ancient Proverb
/// "He who runs a bulk load without a progress bar, loads alone and in darkness."
pub struct ProgressMetrics {
    /// 🏷️ what are we loading into? `keyspace.table`, usually
    target_name: String,
    /// 📏 total rows expected — 0 if we have no idea
    total_rows: u64,
    rows_written: u64,
    chunks_written: u64,
    progress_bar: ProgressBar,
    /// 🔄 sliding window of (timestamp, rows, chunks)
    rate_samples: VecDeque<(Instant, u64, u64)>,
    start_time: Instant,
}

impl std::fmt::Debug for ProgressMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // -- 🎭 custom Debug impl because ProgressBar is a diva and doesn't derive Debug
        f.debug_struct("ProgressMetrics")
            .field("target_name", &self.target_name)
            .field("total_rows", &self.total_rows)
            .field("rows_written", &self.rows_written)
            .field("chunks_written", &self.chunks_written)
            .finish()
    }
}

impl ProgressMetrics {
    /// 🚀 Spin up a new ProgressMetrics drawing to stderr.
    ///
    /// `total_rows` is how many rows we expect. Pass 0 for "I have no idea".
    pub fn new(target_name: String, total_rows: u64) -> Self {
        let progress_bar = ProgressBar::new(total_rows);
        // -- 🎨 cyan because it's classy, blue because it's calm
        if let Ok(style) = ProgressStyle::default_bar().template("{msg}\n| [{bar:40.cyan/blue}]") {
            progress_bar.set_style(style.progress_chars("=>-"));
        }
        Self::with_bar(target_name, total_rows, progress_bar)
    }

    /// 🙈 Same bookkeeping, nothing drawn. For tests and `show_progress = false`.
    pub fn hidden(target_name: String, total_rows: u64) -> Self {
        let progress_bar = ProgressBar::with_draw_target(Some(total_rows), ProgressDrawTarget::hidden());
        Self::with_bar(target_name, total_rows, progress_bar)
    }

    fn with_bar(target_name: String, total_rows: u64, progress_bar: ProgressBar) -> Self {
        let start_time = Instant::now();
        // -- 🔄 seed the rate window with t=0 so we don't divide by zero like animals
        let mut rate_samples = VecDeque::new();
        rate_samples.push_back((start_time, 0u64, 0u64));
        Self {
            target_name,
            total_rows,
            rows_written: 0,
            chunks_written: 0,
            progress_bar,
            rate_samples,
            start_time,
        }
    }

    /// 🔄 One chunk of `rows` just landed.
    pub fn update(&mut self, rows: u64) {
        self.rows_written += rows;
        self.chunks_written += 1;
        let rates = self.calculate_rates();
        self.render(rates);
        self.progress_bar.set_position(self.rows_written);
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    pub fn chunks_written(&self) -> u64 {
        self.chunks_written
    }

    /// ✅ Mark the progress bar done. Ring the bell. We made it (or we stopped trying).
    pub fn finish(&self) {
        self.progress_bar.finish();
    }

    /// 📈 Current rates over a 5-second sliding window.
    fn calculate_rates(&mut self) -> Rates {
        let now = Instant::now();
        let window = Duration::from_secs(5);
        while let Some(&(timestamp, _, _)) = self.rate_samples.front() {
            if now.duration_since(timestamp) > window {
                self.rate_samples.pop_front();
            } else {
                break;
            }
        }
        self.rate_samples
            .push_back((now, self.rows_written, self.chunks_written));

        if let Some(&(oldest_time, oldest_rows, oldest_chunks)) = self.rate_samples.front() {
            let elapsed = now.duration_since(oldest_time).as_secs_f64();
            if elapsed > 0.0 {
                return Rates {
                    rows_per_sec: self.rows_written.saturating_sub(oldest_rows) as f64 / elapsed,
                    chunks_per_sec: self.chunks_written.saturating_sub(oldest_chunks) as f64
                        / elapsed,
                };
            }
        }
        // -- 💤 not enough elapsed time yet — return zeros and maintain composure
        Rates {
            rows_per_sec: 0.0,
            chunks_per_sec: 0.0,
        }
    }

    /// 🎨 Render the rates panel as the progress bar message.
    ///
    /// ```text
    /// | target: <keyspace.table>
    /// | [=====>----------]
    ///   <rows/s>      <rows / total>
    ///   <chunks/s>    <chunks>
    ///   <elapsed>     <remaining>
    /// ```
    fn render(&self, rates: Rates) {
        let percent = if self.total_rows > 0 {
            (self.rows_written as f64 / self.total_rows as f64) * 100.0
        } else {
            0.0
        };

        let elapsed = self.start_time.elapsed();
        let remaining = if percent > 0.0 {
            // 🔮 linear extrapolation — assumes the future looks like the past
            let total_estimated = elapsed.as_secs_f64() / (percent / 100.0);
            let remaining_secs = total_estimated - elapsed.as_secs_f64();
            if remaining_secs > 0.0 {
                format_duration(Duration::from_secs_f64(remaining_secs))
            } else {
                "--:--".to_string()
            }
        } else {
            "--:--".to_string()
        };

        let mut table = Table::new();
        table.load_preset(NOTHING);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.add_row(vec![
            Cell::new(format!("{} Rows/s", format_number(rates.rows_per_sec as u64)))
                .set_alignment(CellAlignment::Right),
            Cell::new(format!(
                "{} / {} Rows ({:.2}%)",
                format_number(self.rows_written),
                format_number(self.total_rows),
                percent
            ))
            .set_alignment(CellAlignment::Right),
        ]);
        table.add_row(vec![
            Cell::new(format!("{:.2} Chunks/s", rates.chunks_per_sec))
                .set_alignment(CellAlignment::Right),
            Cell::new(format!("{} Chunks", format_number(self.chunks_written)))
                .set_alignment(CellAlignment::Right),
        ]);
        table.add_row(vec![
            Cell::new(format!("{} elapsed", format_duration(elapsed)))
                .set_alignment(CellAlignment::Right),
            Cell::new(format!("{} remaining", remaining)).set_alignment(CellAlignment::Right),
        ]);

        self.progress_bar
            .set_message(format!("target: {}\n{}", self.target_name, table));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_one_where_big_numbers_get_commas() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(10_000), "10,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }

    #[test]
    fn the_one_where_durations_pick_their_outfit() {
        assert_eq!(format_duration(Duration::from_secs(75)), "01:15");
        assert_eq!(format_duration(Duration::from_secs(3_725)), "01:02:05");
    }

    #[test]
    fn the_one_where_hidden_progress_still_counts() {
        let mut progress = ProgressMetrics::hidden("ks.t".into(), 300);
        progress.update(100);
        progress.update(100);
        progress.finish();
        assert_eq!(progress.rows_written(), 200);
        assert_eq!(progress.chunks_written(), 2);
    }
}

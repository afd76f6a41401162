use std::fmt::Write;

use indicatif::{ProgressBar, ProgressState, ProgressStyle};

use crate::{
    Error,
    voxelizer::{Progress, VoxelizerSettings},
};

/// Progress bar counting slices over all subdivision levels
pub fn progress_bar(len: u64) -> crate::Result<ProgressBar> {
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{wide_bar}] {pos:>7}/{len:7} ({eta})",
    )
    .map_err(|err| Error::Other(Box::new(err)))?
    .with_key("eta", |state: &ProgressState, w: &mut dyn Write| {
        let _ = write!(w, "{:.1}s", state.eta().as_secs_f64());
    })
    .progress_chars("#>-");
    let progress = ProgressBar::new(len);
    progress.set_style(style);
    Ok(progress)
}

/// Number of progress reports a voxelization will make.
#[must_use]
pub fn progress_len(settings: &VoxelizerSettings, dense: bool) -> u64 {
    if dense {
        return settings.side() as u64;
    }
    // Level n visits 3^(L-n) slices
    (0..settings.levels).map(|n| 3u64.pow(settings.levels - n)).sum()
}

/// Feed voxelizer progress reports into `progress`.
pub fn progress_callback(progress: &ProgressBar) -> impl FnMut(Progress) + '_ {
    move |p: Progress| {
        progress.set_message(format!("level {}", p.level));
        progress.inc(1);
    }
}

//! ✂️ splitter.rs — the deli slicer of the pipeline.
//!
//! 🎬 *[10,000 accounts walk up to the counter. the store only takes 100 at a time.]*
//! *["Take a number," says the splitter. It hands out chunks.]*
//!
//! `split` partitions any ordered sequence into contiguous chunks of at most `size`
//! items. Lazily. A chunk is pulled from the underlying iterator only when someone
//! asks for it, so a generator of a million rows never gets duplicated in RAM.
//!
//! ⚠️ Forward-only. Single pass. Once consumed, gone. If you want the chunks again,
//! call `split` again with a fresh sequence. The past is not restartable. 🦆

use std::iter::{Fuse, FusedIterator};

use crate::errors::InvalidArgument;

/// 🔪 Slice `items` into chunks of at most `size`.
///
/// - `size == 0` → `InvalidArgument::ZeroBatchSize`
/// - negative (or otherwise non-`usize`) sizes → `InvalidArgument::NotRepresentable`
/// - empty input → zero chunks. Not one empty chunk. Zero.
///
/// Concatenating the chunks in order gives back exactly the input.
pub fn split<I, N>(items: I, size: N) -> Result<Chunks<I::IntoIter>, InvalidArgument>
where
    I: IntoIterator,
    N: TryInto<usize>,
    InvalidArgument: From<N::Error>,
{
    let size: usize = size.try_into()?;
    if size == 0 {
        return Err(InvalidArgument::ZeroBatchSize);
    }
    Ok(Chunks {
        iter: items.into_iter().fuse(),
        size,
    })
}

/// 📦 The lazy chunk sequence returned by [`split`].
///
/// Every chunk except possibly the last has exactly `size` items.
#[derive(Debug)]
pub struct Chunks<I: Iterator> {
    iter: Fuse<I>,
    size: usize,
}

impl<I: Iterator> Chunks<I> {
    /// 📏 The chunk size this splitter was built with.
    pub fn chunk_size(&self) -> usize {
        self.size
    }
}

impl<I: Iterator> Iterator for Chunks<I> {
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        // -- 🧮 grab up to `size` items. the first miss means the well is dry.
        let first = self.iter.next()?;
        let mut chunk = Vec::with_capacity(self.size);
        chunk.push(first);
        chunk.extend(self.iter.by_ref().take(self.size - 1));
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (lower, upper) = self.iter.size_hint();
        (
            lower.div_ceil(self.size),
            upper.map(|upper| upper.div_ceil(self.size)),
        )
    }
}

impl<I: Iterator> FusedIterator for Chunks<I> {}

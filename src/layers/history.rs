//! Circular frame history with dilated tap gathering
//!
//! Two ring buffers with identical behaviour: [`HistoryBuffer`] sized at
//! construction, and [`FixedHistory`] sized by const generics with embedded
//! storage.
//!
//! The ring holds the last `state_size = (kernel_size - 1) * dilation_rate + 1`
//! frames. After a write, the slot under the write cursor holds the oldest
//! frame still in the receptive field, so tap `k` (oldest first) lives at
//! slot `(write_pos + k * dilation_rate) % state_size`.

use super::config::state_size;
use super::layer::Scalar;

// ============================================================================
// Runtime-sized history
// ============================================================================

/// Ring of the most recent input frames, sized at construction
///
/// Frames are stored contiguously (`slot * in_size + channel`). Gathered taps
/// use the same layout (`tap * in_size + channel`) so a whole window can be
/// reduced against a kernel with a single zip.
#[derive(Debug)]
pub struct HistoryBuffer<T> {
    in_size: usize,
    kernel_size: usize,
    dilation_rate: usize,
    state_size: usize,
    /// `state_size` frames of `in_size` values
    state: Vec<T>,
    /// `kernel_size` taps of `in_size` values, rebuilt every step
    gathered: Vec<T>,
    /// Next slot to overwrite
    write_pos: usize,
}

impl<T: Scalar> HistoryBuffer<T> {
    /// Create a zeroed history
    ///
    /// Only built from a validated [`Conv1DConfig`](super::Conv1DConfig), so
    /// every size is at least 1 and the buffer lengths fit in `usize`.
    pub(crate) fn new(in_size: usize, kernel_size: usize, dilation_rate: usize) -> Self {
        let state_size = state_size(kernel_size, dilation_rate);
        Self {
            in_size,
            kernel_size,
            dilation_rate,
            state_size,
            state: vec![T::zero(); in_size * state_size],
            gathered: vec![T::zero(); in_size * kernel_size],
            write_pos: 0,
        }
    }

    pub fn state_size(&self) -> usize {
        self.state_size
    }

    /// Store a frame and advance the write cursor
    ///
    /// # Panics
    /// If `frame.len() != in_size`.
    #[inline]
    pub fn write(&mut self, frame: &[T]) {
        assert_eq!(frame.len(), self.in_size, "input frame has wrong length");
        let start = self.write_pos * self.in_size;
        self.state[start..start + self.in_size].copy_from_slice(frame);
        self.write_pos = if self.write_pos + 1 == self.state_size {
            0
        } else {
            self.write_pos + 1
        };
    }

    /// Copy the dilated taps for the current step, oldest first
    ///
    /// Returns `kernel_size * in_size` values laid out tap by tap.
    #[inline]
    pub fn gather(&mut self) -> &[T] {
        let in_size = self.in_size;
        for (k, tap) in self.gathered.chunks_exact_mut(in_size).enumerate() {
            let slot = (self.write_pos + k * self.dilation_rate) % self.state_size;
            let start = slot * in_size;
            tap.copy_from_slice(&self.state[start..start + in_size]);
        }
        &self.gathered
    }

    /// Zero all frames and rewind the cursor
    pub fn reset(&mut self) {
        self.state.fill(T::zero());
        self.gathered.fill(T::zero());
        self.write_pos = 0;
    }
}

impl<T: Scalar> Clone for HistoryBuffer<T> {
    /// A clone is a fresh, empty history of the same shape.
    fn clone(&self) -> Self {
        Self::new(self.in_size, self.kernel_size, self.dilation_rate)
    }
}

// ============================================================================
// Compile-time-sized history
// ============================================================================

/// Ring of the most recent input frames with all sizes fixed at compile time
///
/// `STATE` must equal [`state_size`]`(KERNEL, DILATION)`; this is checked when
/// the type is instantiated.
#[derive(Debug, Clone, Copy)]
pub struct FixedHistory<
    T,
    const IN: usize,
    const KERNEL: usize,
    const DILATION: usize,
    const STATE: usize,
> {
    state: [[T; IN]; STATE],
    gathered: [[T; IN]; KERNEL],
    write_pos: usize,
}

impl<T: Scalar, const IN: usize, const KERNEL: usize, const DILATION: usize, const STATE: usize>
    FixedHistory<T, IN, KERNEL, DILATION, STATE>
{
    const SIZES_OK: () = {
        assert!(IN >= 1, "IN must be at least 1");
        assert!(KERNEL >= 1, "KERNEL must be at least 1");
        assert!(DILATION >= 1, "DILATION must be at least 1");
        assert!(
            STATE == state_size(KERNEL, DILATION),
            "STATE must equal (KERNEL - 1) * DILATION + 1"
        );
    };

    pub fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::SIZES_OK;
        Self {
            state: [[T::zero(); IN]; STATE],
            gathered: [[T::zero(); IN]; KERNEL],
            write_pos: 0,
        }
    }

    /// Store a frame and advance the write cursor
    #[inline(always)]
    pub fn write(&mut self, frame: &[T; IN]) {
        self.state[self.write_pos] = *frame;
        self.write_pos = if self.write_pos + 1 == STATE {
            0
        } else {
            self.write_pos + 1
        };
    }

    /// Copy the dilated taps for the current step, oldest first
    #[inline(always)]
    pub fn gather(&mut self) -> &[[T; IN]; KERNEL] {
        for (k, tap) in self.gathered.iter_mut().enumerate() {
            *tap = self.state[(self.write_pos + k * DILATION) % STATE];
        }
        &self.gathered
    }

    /// Zero all frames and rewind the cursor
    pub fn reset(&mut self) {
        self.state = [[T::zero(); IN]; STATE];
        self.gathered = [[T::zero(); IN]; KERNEL];
        self.write_pos = 0;
    }
}

impl<T: Scalar, const IN: usize, const KERNEL: usize, const DILATION: usize, const STATE: usize>
    Default for FixedHistory<T, IN, KERNEL, DILATION, STATE>
{
    fn default() -> Self {
        Self::new()
    }
}

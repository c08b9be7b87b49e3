/// Bits per storage word of the bitmap.
const WORD_BITS: usize = u8::BITS as usize;

/// Block occupancy bitmap: one bit per block, packed eight to a word,
/// `1` = in use.
///
/// ```text
///  block index:   0        8        16
///                 v        v        v
///               +--------+--------+----~~--+
///  words:       |01100000|00000001|  ...   |
///               +--------+--------+----~~--+
/// ```
///
/// The word/mask pair for a bit is derived in exactly one place,
/// [`Bitmap::locate`], which also bounds-checks the index. Nothing else in
/// the crate touches the packing layout.
///
/// The count of set bits always equals `block_count - free_block_count` of
/// the owning pool. [`Bitmap::used`] exists so tests can state that
/// invariant directly.
pub(crate) struct Bitmap {
    words: Box<[u8]>,
    /// Number of addressable bits. Trailing bits of the last word stay zero.
    len: usize,
}

impl Bitmap {
    /// A bitmap of `len` bits, all clear.
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0u8; len.div_ceil(WORD_BITS)].into_boxed_slice(),
            len,
        }
    }

    /// Word index and mask for bit `index`.
    ///
    /// Panics when `index` is out of range; every accessor below goes
    /// through here.
    #[inline]
    fn locate(&self, index: usize) -> (usize, u8) {
        assert!(
            index < self.len,
            "bit index {index} out of range for {} blocks",
            self.len
        );

        (index / WORD_BITS, 1 << (index % WORD_BITS))
    }

    /// Whether bit `index` is set.
    pub fn get(&self, index: usize) -> bool {
        let (word, mask) = self.locate(index);

        self.words[word] & mask != 0
    }

    fn set(&mut self, index: usize) {
        let (word, mask) = self.locate(index);
        debug_assert_eq!(self.words[word] & mask, 0, "block {index} already in use");

        self.words[word] |= mask;
    }

    fn clear(&mut self, index: usize) {
        let (word, mask) = self.locate(index);
        debug_assert_ne!(self.words[word] & mask, 0, "block {index} already free");

        self.words[word] &= !mask;
    }

    /// Marks the run `[start, start + len)` as in use.
    pub fn set_run(&mut self, start: usize, len: usize) {
        for index in start..start + len {
            self.set(index);
        }
    }

    /// Marks the run `[start, start + len)` as free.
    pub fn clear_run(&mut self, start: usize, len: usize) {
        for index in start..start + len {
            self.clear(index);
        }
    }

    /// First set bit in `[start, start + len)`, if any. The run search uses
    /// this to find the block an extension attempt collided with.
    pub fn first_used_in(&self, start: usize, len: usize) -> Option<usize> {
        (start..start + len).find(|&index| self.get(index))
    }

    /// Number of bits currently set.
    pub fn used(&self) -> usize {
        self.words.iter().map(|word| word.count_ones() as usize).sum()
    }
}

//! Human-readable rendering of heap state.
//!
//! One line per bitmap byte. Each line starts with the byte index in
//! parentheses, then shows its eight arena positions: the arena byte value
//! as ` 0xNN` when the position is occupied, ` ____` when it is free or a
//! sentinel.
//!
//! ```text
//! (0)  0x2A 0x2A 0x2A ____ ____ ____ ____ ____
//! (1)  ____ ____ ____ ____ ____ ____ ____ ____
//! ```

use std::fmt;

use crate::heap::BitHeap;

/// [`Display`](fmt::Display) adaptor returned by [`BitHeap::display`].
pub struct HeapDump<'a> {
    heap: &'a BitHeap,
}

impl<'a> HeapDump<'a> {
    pub(crate) fn new(heap: &'a BitHeap) -> Self {
        Self { heap }
    }
}

impl fmt::Display for HeapDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bitmap = self.heap.bitmap();
        let arena = self.heap.arena();
        for row in 0..bitmap.byte_len() {
            write!(f, "({row}) ")?;
            for pos in row * 8..row * 8 + 8 {
                if bitmap.is_set(pos) {
                    write!(f, " 0x{:02X}", arena[pos])?;
                } else {
                    f.write_str(" ____")?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::heap::BitHeap;

    #[test]
    fn empty_heap_renders_placeholders() {
        let heap = BitHeap::with_size_log(4).unwrap();
        let text = heap.display().to_string();
        assert_eq!(
            text,
            "(0)  ____ ____ ____ ____ ____ ____ ____ ____\n\
             (1)  ____ ____ ____ ____ ____ ____ ____ ____\n"
        );
    }

    #[test]
    fn occupied_bytes_show_values() {
        let mut heap = BitHeap::with_size_log(3).unwrap();
        let a = heap.alloc(3).unwrap();
        heap.bytes_mut(&a).copy_from_slice(&[0x2A, 0x00, 0xFF]);
        assert_eq!(
            heap.display().to_string(),
            "(0)  0x2A 0x00 0xFF ____ ____ ____ ____ ____\n"
        );
    }

    #[test]
    fn dump_writes_to_sink_without_mutating() {
        let mut heap = BitHeap::with_size_log(5).unwrap();
        let _ = heap.alloc(9).unwrap();
        let before = heap.free_bytes();

        let mut out = Vec::new();
        heap.dump(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(text.lines().count(), 4);
        assert!(text.starts_with("(0)  0x00"));
        assert!(text.contains("(1)  0x00 ____"));
        assert_eq!(heap.free_bytes(), before);
    }
}

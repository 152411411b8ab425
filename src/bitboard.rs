//! A fixed-size cell set using const generics.
//!
//! Boards are an `N×N` grid packed into an unsigned integer `T`, addressed by
//! [`Coord`]. The type is `no_std` friendly and never allocates.

use core::ops::{BitAnd, BitOr, BitOrAssign};
use core::{any, fmt, mem};
use num_traits::{PrimInt, Unsigned, Zero};

use crate::coord::Coord;

/// A fixed-size N×N set of cells stored in the unsigned integer `T`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct BitBoard<T, const N: usize>
where
    T: PrimInt + Unsigned + Zero,
{
    bits: T,
}

impl<T, const N: usize> BitBoard<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    const FITS: () = assert!(N * N <= mem::size_of::<T>() * 8, "N*N exceeds T::BITS");

    /// Create an empty board. Fails to compile when `N*N` does not fit in `T`.
    #[inline]
    pub fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::FITS;
        BitBoard { bits: T::zero() }
    }

    /// Number of cells in the set.
    pub fn count_ones(&self) -> usize {
        self.bits.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_zero()
    }

    #[inline]
    fn bit(coord: Coord) -> Option<T> {
        if coord.row() >= N || coord.col() >= N {
            return None;
        }
        Some(T::one() << (coord.row() * N + coord.col()))
    }

    /// Whether `coord` is in the set.
    pub fn contains(&self, coord: Coord) -> bool {
        Self::bit(coord).is_some_and(|b| !(self.bits & b).is_zero())
    }

    /// Add `coord`; returns `false` if it was already present or off-board.
    pub fn insert(&mut self, coord: Coord) -> bool {
        match Self::bit(coord) {
            Some(b) if (self.bits & b).is_zero() => {
                self.bits = self.bits | b;
                true
            }
            _ => false,
        }
    }

    /// Remove `coord`; returns `false` if it was not present.
    pub fn remove(&mut self, coord: Coord) -> bool {
        match Self::bit(coord) {
            Some(b) if !(self.bits & b).is_zero() => {
                self.bits = self.bits & !b;
                true
            }
            _ => false,
        }
    }

    /// Iterator over the cells in the set, row-major.
    pub fn iter(&self) -> Cells<T, N> {
        Cells {
            bits: self.bits,
            idx: 0,
        }
    }
}

impl<T, const N: usize> Default for BitBoard<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> FromIterator<Coord> for BitBoard<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    fn from_iter<I: IntoIterator<Item = Coord>>(iter: I) -> Self {
        let mut board = Self::new();
        for c in iter {
            board.insert(c);
        }
        board
    }
}

impl<T, const N: usize> fmt::Debug for BitBoard<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "BitBoard<{}, {}>:", any::type_name::<T>(), N)?;
        for r in 0..N {
            for c in 0..N {
                let set = !((self.bits >> (r * N + c)) & T::one()).is_zero();
                write!(f, "{} ", if set { '■' } else { '□' })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Iterator over the cells of a bitboard.
#[derive(Clone, Copy)]
pub struct Cells<T, const N: usize> {
    bits: T,
    idx: usize,
}

impl<T, const N: usize> Iterator for Cells<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    type Item = Coord;

    fn next(&mut self) -> Option<Self::Item> {
        while self.idx < N * N {
            let idx = self.idx;
            self.idx += 1;
            if !((self.bits >> idx) & T::one()).is_zero() {
                if let Ok(c) = Coord::new(idx / N, idx % N) {
                    return Some(c);
                }
            }
        }
        None
    }
}

impl<T, const N: usize> BitAnd for BitBoard<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        BitBoard {
            bits: self.bits & rhs.bits,
        }
    }
}

impl<T, const N: usize> BitOr for BitBoard<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        BitBoard {
            bits: self.bits | rhs.bits,
        }
    }
}

impl<T, const N: usize> BitOrAssign for BitBoard<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.bits = self.bits | rhs.bits;
    }
}

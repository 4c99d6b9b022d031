//! `Array<T>`: a growable, pool-backed vector.
//!
//! Mirrors alloc.c's `array_header`: elements are packed into pool memory
//! that doubles in size (copying the old contents) whenever it fills up.
//! Old backing storage is never freed individually — like everything else
//! in a pool, it's reclaimed in bulk when the pool is cleared or
//! destroyed. Element types are required to be `Copy` because pool memory
//! is never `Drop`-run; that rules out types whose destructor matters,
//! which matches alloc.c's arrays (they only ever held scalars,
//! `char *`s, and other arrays/tables).

use std::cell::Cell;
use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::pool::Pool;

/// A growable vector allocated out of a [`Pool`].
pub struct Array<T: Copy> {
    pool: Pool,
    ptr: Cell<NonNull<T>>,
    len: Cell<usize>,
    capacity: Cell<usize>,
    _marker: PhantomData<T>,
}

const DEFAULT_CAPACITY: usize = 4;

impl<T: Copy> Array<T> {
    /// Creates an empty array with room for `capacity` elements before its
    /// first growth. Mirrors alloc.c's `make_array_core`.
    pub fn with_capacity(pool: &Pool, capacity: usize) -> Array<T> {
        let capacity = capacity.max(1);
        let ptr = Self::allocate(pool, capacity);
        Array {
            pool: pool.clone(),
            ptr: Cell::new(ptr),
            len: Cell::new(0),
            capacity: Cell::new(capacity),
            _marker: PhantomData,
        }
    }

    /// Creates an empty array with a small default capacity.
    pub fn new(pool: &Pool) -> Array<T> {
        Self::with_capacity(pool, DEFAULT_CAPACITY)
    }

    fn allocate(pool: &Pool, capacity: usize) -> NonNull<T> {
        let bytes = capacity
            .checked_mul(std::mem::size_of::<T>())
            .expect("array capacity overflow");
        let buf = pool
            .alloc(bytes.max(1) as isize)
            .expect("positive byte count");
        // SAFETY: pool blocks are aligned to the platform's strictest
        // alignment (`CLICK_SZ`), which covers any `T` this array holds.
        unsafe { NonNull::new_unchecked(buf.as_mut_ptr() as *mut T) }
    }

    /// Number of elements currently stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.len.get()
    }

    /// Whether the array holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current backing capacity, in elements.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Truncates the array to zero elements without releasing its backing
    /// storage.
    pub fn clear(&self) {
        self.len.set(0);
    }

    fn grow_to_fit(&self, additional: usize) {
        let required = self.len.get() + additional;
        if required <= self.capacity.get() {
            return;
        }
        let mut new_capacity = self.capacity.get().max(1);
        while new_capacity < required {
            new_capacity *= 2;
        }
        let new_ptr = Self::allocate(&self.pool, new_capacity);
        // SAFETY: `new_ptr` points at freshly allocated, non-overlapping
        // memory at least `len` elements long; `self.ptr` holds exactly
        // `len` initialized elements.
        unsafe {
            std::ptr::copy_nonoverlapping(self.ptr.get().as_ptr(), new_ptr.as_ptr(), self.len.get());
        }
        self.ptr.set(new_ptr);
        self.capacity.set(new_capacity);
    }

    /// Appends `value`, growing the backing storage if necessary.
    ///
    /// Mirrors alloc.c's `push_array`.
    pub fn push(&self, value: T) {
        self.grow_to_fit(1);
        let len = self.len.get();
        // SAFETY: capacity was just ensured to be > len.
        unsafe {
            self.ptr.get().as_ptr().add(len).write(value);
        }
        self.len.set(len + 1);
    }

    /// Appends every element of `values`, in order.
    ///
    /// Mirrors alloc.c's `array_cat`.
    pub fn extend_from(&self, values: &[T]) {
        if values.is_empty() {
            return;
        }
        self.grow_to_fit(values.len());
        let len = self.len.get();
        // SAFETY: capacity was just ensured to hold `len + values.len()`.
        unsafe {
            std::ptr::copy_nonoverlapping(values.as_ptr(), self.ptr.get().as_ptr().add(len), values.len());
        }
        self.len.set(len + values.len());
    }

    /// A read-only view of the array's elements.
    ///
    /// The returned slice borrows only `&self`, not the backing pool, so
    /// nothing stops the pool from being [cleared](Pool::clear) or
    /// [destroyed](Pool::destroy) — which stamps or reuses this exact
    /// memory — while this slice is still alive. Don't hold a slice from
    /// this call across a `clear`/`destroy` of the owning pool.
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: [0, len) is always initialized by `push`/`extend_from`.
        unsafe { std::slice::from_raw_parts(self.ptr.get().as_ptr(), self.len.get()) }
    }

    /// Copies this array's contents into a freshly allocated array backed
    /// by `pool` (which may be the same pool or an entirely unrelated
    /// one — copying across pool subtrees is the whole point).
    ///
    /// Mirrors alloc.c's `copy_array`/`copy_array_hdr_core`.
    pub fn copy_to(&self, pool: &Pool) -> Array<T> {
        let copy = Array::with_capacity(pool, self.capacity.get().max(1));
        copy.extend_from(self.as_slice());
        copy
    }

    /// Appends every element of `other` onto `self`, copying the values
    /// rather than aliasing `other`'s storage.
    ///
    /// Mirrors alloc.c's `append_arrays`.
    pub fn append(&self, other: &Array<T>) {
        self.extend_from(other.as_slice());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AllocatorConfig;

    fn pool() -> Pool {
        Pool::new(AllocatorConfig::default())
    }

    #[test]
    fn push_grows_past_initial_capacity() {
        let pool = pool();
        let arr: Array<u32> = Array::with_capacity(&pool, 2);
        for i in 0..10 {
            arr.push(i);
        }
        assert_eq!(arr.len(), 10);
        assert!(arr.capacity() >= 10);
        assert_eq!(arr.as_slice(), &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn extend_from_appends_a_slice() {
        let pool = pool();
        let arr: Array<i32> = Array::new(&pool);
        arr.extend_from(&[1, 2, 3]);
        arr.extend_from(&[4, 5]);
        assert_eq!(arr.as_slice(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn clear_truncates_without_losing_capacity() {
        let pool = pool();
        let arr: Array<u8> = Array::new(&pool);
        arr.extend_from(&[1, 2, 3]);
        let capacity_before = arr.capacity();
        arr.clear();
        assert_eq!(arr.len(), 0);
        assert_eq!(arr.capacity(), capacity_before);
    }

    #[test]
    fn append_concatenates_two_arrays() {
        let pool = pool();
        let a: Array<i32> = Array::new(&pool);
        a.extend_from(&[1, 2]);
        let b: Array<i32> = Array::new(&pool);
        b.extend_from(&[3, 4]);
        a.append(&b);
        assert_eq!(a.as_slice(), &[1, 2, 3, 4]);
    }

    #[test]
    fn copy_to_duplicates_into_another_pool() {
        let pool_a = pool();
        let pool_b = pool();
        let arr: Array<i32> = Array::new(&pool_a);
        arr.extend_from(&[7, 8, 9]);
        let copy = arr.copy_to(&pool_b);
        assert_eq!(copy.as_slice(), arr.as_slice());
    }
}

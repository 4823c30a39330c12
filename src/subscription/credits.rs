use std::sync::atomic::{AtomicU32, Ordering};

/// Счётчик кредитов подписки в диапазоне `[0, capacity]`.
///
/// Все изменения идут через `fetch_update`, поэтому проверка границы и
/// изменение значения атомарны.
#[derive(Debug)]
pub struct Credits {
    capacity: u32,
    available: AtomicU32,
}

/// Попытка вернуть больше кредитов, чем помещается в ёмкость.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreditOverflow {
    pub capacity: u32,
    pub available: u32,
    pub released: u32,
}

impl Credits {
    /// Новый счётчик, заполненный до `capacity`.
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            available: AtomicU32::new(capacity),
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn available(&self) -> u32 {
        self.available.load(Ordering::Acquire)
    }

    /// Забирает ровно `n` кредитов. При нехватке ничего не меняет и
    /// возвращает `false`.
    pub fn try_acquire(
        &self,
        n: u32,
    ) -> bool {
        self.available
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                current.checked_sub(n)
            })
            .is_ok()
    }

    /// Возвращает `n` кредитов.
    ///
    /// Выход за `capacity` означает двойное завершение; счётчик при этом
    /// не меняется.
    pub fn release(
        &self,
        n: u32,
    ) -> Result<u32, CreditOverflow> {
        let capacity = self.capacity;
        self.available
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                current.checked_add(n).filter(|next| *next <= capacity)
            })
            .map(|previous| previous + n)
            .map_err(|available| CreditOverflow {
                capacity,
                available,
                released: n,
            })
    }

    /// Количество занятых слотов.
    pub fn in_use(&self) -> u32 {
        self.capacity - self.available()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

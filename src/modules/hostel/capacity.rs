//! Occupancy arithmetic shared by hostel rooms and bus seats.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occupancy {
    pub occupied: i64,
    pub capacity: i64,
}

impl Occupancy {
    pub fn new(occupied: i64, capacity: i32) -> Self {
        Self {
            occupied,
            capacity: i64::from(capacity),
        }
    }

    pub fn free(&self) -> i64 {
        (self.capacity - self.occupied).max(0)
    }

    /// A room at or above capacity admits nobody, including after a
    /// capacity reduction left it over-full.
    pub fn has_space(&self) -> bool {
        self.occupied < self.capacity
    }

    /// Capacity may only shrink down to the current occupancy.
    pub fn can_resize_to(&self, capacity: i32) -> bool {
        i64::from(capacity) >= self.occupied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_until_full() {
        assert!(Occupancy::new(0, 2).has_space());
        assert!(Occupancy::new(1, 2).has_space());
        assert!(!Occupancy::new(2, 2).has_space());
        assert!(!Occupancy::new(3, 2).has_space());
    }

    #[test]
    fn test_free_never_negative() {
        assert_eq!(Occupancy::new(1, 4).free(), 3);
        assert_eq!(Occupancy::new(5, 4).free(), 0);
    }

    #[test]
    fn test_resize() {
        let o = Occupancy::new(3, 4);
        assert!(o.can_resize_to(3));
        assert!(!o.can_resize_to(2));
    }
}

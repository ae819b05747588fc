/*
 * SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
 *
 * SPDX-License-Identifier: GPL-2.0-or-later
 */
use crate::error::{IpmiError, IpmiResult};

/// A reservation token. At most one is live; reserving again supersedes it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Reservation {
    id: u16,
    valid: bool,
}

impl Reservation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next id. 0 is never handed out.
    pub fn reserve(&mut self) -> u16 {
        self.id = self.id.wrapping_add(1);
        if self.id == 0 {
            self.id = 1;
        }
        self.valid = true;
        self.id
    }

    pub fn cancel(&mut self) {
        self.valid = false;
    }

    pub fn current(&self) -> Option<u16> {
        self.valid.then_some(self.id)
    }

    pub fn is_valid(&self, id: u16) -> bool {
        self.valid && self.id == id
    }

    pub fn check(&self, id: u16) -> IpmiResult<()> {
        if self.is_valid(id) {
            Ok(())
        } else {
            Err(IpmiError::InvalidReservation)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserve_never_returns_zero() {
        let mut r = Reservation::new();
        assert_eq!(r.reserve(), 1);
        for _ in 0..65535 {
            assert_ne!(r.reserve(), 0);
        }
        // 1 + 65535 calls wrap past 0xffff straight to 1
        assert_eq!(r.current(), Some(1));
    }

    #[test]
    fn test_new_reservation_supersedes() {
        let mut r = Reservation::new();
        assert!(r.check(0).is_err());
        let first = r.reserve();
        let second = r.reserve();
        assert_eq!(r.check(first), Err(IpmiError::InvalidReservation));
        assert!(r.check(second).is_ok());
        r.cancel();
        assert!(r.check(second).is_err());
        assert_eq!(r.current(), None);
    }
}

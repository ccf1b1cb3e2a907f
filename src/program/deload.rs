//! Deload week scheduling
//!
//! Decides which weeks of a cycle are deloads. The tracker only reads the
//! resulting `is_deload` flags; triggering a deload by hand flips one later.

use crate::cycle::WeekInfo;

/// Picks deload weeks for a cycle of a given length
pub trait DeloadPolicy {
    fn is_deload(&self, week_number: u32, total_weeks: u32) -> bool;

    /// Build the week list for a new cycle
    fn schedule(&self, total_weeks: u32) -> Vec<WeekInfo> {
        (1..=total_weeks)
            .map(|week_number| WeekInfo {
                week_number,
                is_deload: self.is_deload(week_number, total_weeks),
            })
            .collect()
    }
}

/// Never schedule a deload
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDeload;

impl DeloadPolicy for NoDeload {
    fn is_deload(&self, _week_number: u32, _total_weeks: u32) -> bool {
        false
    }
}

/// Every Nth week is a deload (N = 4 gives weeks 4, 8, ...)
#[derive(Debug, Clone, Copy)]
pub struct EveryNthWeek(pub u32);

impl DeloadPolicy for EveryNthWeek {
    fn is_deload(&self, week_number: u32, _total_weeks: u32) -> bool {
        self.0 > 0 && week_number % self.0 == 0
    }
}

/// The last week of the cycle is a deload, unless the cycle is a single week
#[derive(Debug, Clone, Copy, Default)]
pub struct FinalWeek;

impl DeloadPolicy for FinalWeek {
    fn is_deload(&self, week_number: u32, total_weeks: u32) -> bool {
        total_weeks > 1 && week_number == total_weeks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deload_weeks(policy: &dyn DeloadPolicy, total: u32) -> Vec<u32> {
        policy
            .schedule(total)
            .into_iter()
            .filter(|w| w.is_deload)
            .map(|w| w.week_number)
            .collect()
    }

    #[test]
    fn test_schedule_numbers_weeks_from_one() {
        let weeks = NoDeload.schedule(3);
        let numbers: Vec<u32> = weeks.iter().map(|w| w.week_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(weeks.iter().all(|w| !w.is_deload));
    }

    #[test]
    fn test_every_nth_week() {
        assert_eq!(deload_weeks(&EveryNthWeek(4), 9), vec![4, 8]);
        assert!(deload_weeks(&EveryNthWeek(0), 9).is_empty());
    }

    #[test]
    fn test_final_week() {
        assert_eq!(deload_weeks(&FinalWeek, 6), vec![6]);
        assert!(deload_weeks(&FinalWeek, 1).is_empty());
    }
}


use std::time::Duration;

use crate::vklint;

/// Timeout argument of Vulkan wait calls, in nanoseconds once converted.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum VkTimeDuration {
    Immediate,
    Time(Duration),
    Infinite,
}

impl From<VkTimeDuration> for vklint {

    fn from(time: VkTimeDuration) -> vklint {
        match time {
            | VkTimeDuration::Immediate => 0,
            // saturate instead of wrapping for very long durations.
            | VkTimeDuration::Time(time) => vklint::try_from(time.as_nanos()).unwrap_or(vklint::MAX),
            | VkTimeDuration::Infinite => vklint::MAX,
        }
    }
}

impl Default for VkTimeDuration {

    fn default() -> VkTimeDuration {
        VkTimeDuration::Time(Duration::from_secs(1))
    }
}


#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn durations_convert_to_nanoseconds() {

        assert_eq!(vklint::from(VkTimeDuration::Immediate), 0);
        assert_eq!(vklint::from(VkTimeDuration::Infinite), u64::MAX);
        assert_eq!(vklint::from(VkTimeDuration::Time(Duration::from_millis(1500))), 1_500_000_000);
        assert_eq!(vklint::from(VkTimeDuration::Time(Duration::MAX)), u64::MAX);
    }
}

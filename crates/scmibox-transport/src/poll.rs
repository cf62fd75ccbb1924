use crate::config::PollPolicy;

/// Evaluate `ready` until it returns true or the policy's poll budget runs out.
///
/// Returns the number of polls taken, or `None` after exactly `max_polls`
/// unsuccessful polls. A zero budget still polls once. The interval is slept
/// between polls, never after the last one.
pub fn poll_until<F>(policy: &PollPolicy, mut ready: F) -> Option<u32>
where
    F: FnMut() -> bool,
{
    let max_polls = policy.max_polls.max(1);
    for poll in 1..=max_polls {
        if ready() {
            return Some(poll);
        }
        if poll < max_polls && !policy.interval.is_zero() {
            std::thread::sleep(policy.interval);
        }
    }
    None
}

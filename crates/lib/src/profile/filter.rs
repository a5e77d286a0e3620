use crate::consts::RESERVED_TOKEN;

/// Strip every line containing the reserved tracing token from captured output.
///
/// Line order and line endings of the remaining lines are preserved.
pub fn filter_profile(raw: &str) -> String {
  raw
    .split_inclusive('\n')
    .filter(|line| !line.contains(RESERVED_TOKEN))
    .collect()
}

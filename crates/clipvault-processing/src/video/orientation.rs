use clipvault_core::models::{OrientationClass, ProbeResult};

/// Classify geometry by exact 16:9 ratio.
///
/// Anything that is not exactly 16:9 or 9:16, including zero dimensions, is `Other`.
pub fn classify(probe: ProbeResult) -> OrientationClass {
    let width = u64::from(probe.width);
    let height = u64::from(probe.height);

    if width == 0 || height == 0 {
        OrientationClass::Other
    } else if width * 9 == height * 16 {
        OrientationClass::Landscape
    } else if height * 9 == width * 16 {
        OrientationClass::Portrait
    } else {
        OrientationClass::Other
    }
}

/// Segment-test outcome for a candidate pixel
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CornerType {
    /// Arc of circle pixels brighter than the centre
    Bright,
    /// Arc of circle pixels darker than the centre
    Dark,
}

use crate::error::{ChannelKind, SkeletalLoadError};
use crate::source::{SourceInterpolation, SourceKey};
use glam::{Quat, Vec3};
use std::cmp::Ordering;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Keyframe<T> {
    pub time: f32,
    pub value: T,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Interpolation {
    Step,
    #[default]
    Linear,
}

impl From<SourceInterpolation> for Interpolation {
    fn from(source: SourceInterpolation) -> Self {
        match source {
            SourceInterpolation::Step => Interpolation::Step,
            SourceInterpolation::Linear => Interpolation::Linear,
        }
    }
}

/// Values that can live in a keyframe sequence.
pub trait KeyValue: Copy {
    fn is_finite_value(&self) -> bool;
    fn blend(&self, other: &Self, factor: f32) -> Self;
    fn sanitize(self) -> Self {
        self
    }
}

impl KeyValue for Vec3 {
    fn is_finite_value(&self) -> bool {
        self.is_finite()
    }

    fn blend(&self, other: &Self, factor: f32) -> Self {
        self.lerp(*other, factor)
    }
}

impl KeyValue for Quat {
    fn is_finite_value(&self) -> bool {
        self.is_finite()
    }

    fn blend(&self, other: &Self, factor: f32) -> Self {
        self.slerp(*other, factor).normalize()
    }

    fn sanitize(self) -> Self {
        if self.length_squared() > 0.0 {
            self.normalize()
        } else {
            Quat::IDENTITY
        }
    }
}

/// Where a time falls inside a keyframe sequence.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Segment {
    /// Use the key at this index as is: single-key sequences and times outside the covered range.
    Hold(usize),
    /// Interpolate between `index` and `index + 1`; `factor` lies in `[0, 1)`.
    Blend { index: usize, factor: f32 },
}

#[derive(Clone, Debug)]
pub struct KeyframeTrack<T> {
    pub interpolation: Interpolation,
    pub keyframes: Arc<[Keyframe<T>]>,
}

impl<T: KeyValue> KeyframeTrack<T> {
    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    pub fn first_time(&self) -> f32 {
        self.keyframes.first().map(|kf| kf.time).unwrap_or(0.0)
    }

    pub fn last_time(&self) -> f32 {
        self.keyframes.last().map(|kf| kf.time).unwrap_or(0.0)
    }

    /// Times at or past the final key clamp to it; times before the first key hold the first.
    pub fn locate(&self, time: f32) -> Segment {
        let frames = self.keyframes.as_ref();
        let last = frames.len().saturating_sub(1);
        if frames.len() <= 1 {
            return Segment::Hold(0);
        }
        if !(time >= frames[0].time) {
            return Segment::Hold(0);
        }
        if time >= frames[last].time {
            return Segment::Hold(last);
        }
        let index = frames.partition_point(|kf| kf.time <= time) - 1;
        let start = frames[index].time;
        let span = (frames[index + 1].time - start).max(f32::EPSILON);
        // rounding can reach 1.0 just below the next key
        let factor = ((time - start) / span).clamp(0.0, 1.0 - f32::EPSILON);
        Segment::Blend { index, factor }
    }

    pub fn sample(&self, time: f32) -> T {
        let frames = self.keyframes.as_ref();
        match self.locate(time) {
            Segment::Hold(index) => frames[index].value,
            Segment::Blend { index, factor } => match self.interpolation {
                Interpolation::Step => frames[index].value,
                Interpolation::Linear => frames[index].value.blend(&frames[index + 1].value, factor),
            },
        }
    }
}

/// Validates, orders and deduplicates raw keys. Keys sharing a timestamp collapse to the later one.
pub fn build_track<T: KeyValue>(
    bone: &str,
    channel: ChannelKind,
    interpolation: Interpolation,
    keys: &[SourceKey<T>],
) -> Result<KeyframeTrack<T>, SkeletalLoadError> {
    if keys.is_empty() {
        return Err(SkeletalLoadError::EmptyKeyframes { bone: bone.to_string(), channel });
    }
    let mut frames: Vec<(usize, Keyframe<T>)> = Vec::with_capacity(keys.len());
    for (index, key) in keys.iter().enumerate() {
        if !key.time.is_finite() || !key.value.is_finite_value() {
            return Err(SkeletalLoadError::NonFiniteKeyframe { bone: bone.to_string(), channel });
        }
        if key.time < 0.0 {
            return Err(SkeletalLoadError::NegativeKeyframeTime {
                bone: bone.to_string(),
                channel,
                time: key.time,
            });
        }
        frames.push((index, Keyframe { time: key.time, value: key.value.sanitize() }));
    }
    frames.sort_by(|a, b| match a.1.time.partial_cmp(&b.1.time).unwrap_or(Ordering::Equal) {
        Ordering::Equal => a.0.cmp(&b.0),
        order => order,
    });
    let mut deduped: Vec<Keyframe<T>> = Vec::with_capacity(frames.len());
    for (_, frame) in frames {
        if let Some(last) = deduped.last_mut() {
            if frame.time == last.time {
                *last = frame;
                continue;
            }
        }
        deduped.push(frame);
    }
    Ok(KeyframeTrack { interpolation, keyframes: Arc::from(deduped.into_boxed_slice()) })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vec3_track(keys: &[(f32, Vec3)]) -> KeyframeTrack<Vec3> {
        let raw: Vec<SourceKey<Vec3>> = keys.iter().map(|(t, v)| SourceKey::new(*t, *v)).collect();
        build_track("bone", ChannelKind::Position, Interpolation::Linear, &raw).expect("valid track")
    }

    #[test]
    fn locate_reports_factor_within_segment() {
        let track = vec3_track(&[(0.0, Vec3::ZERO), (2.0, Vec3::X), (6.0, Vec3::Y)]);
        assert_eq!(track.locate(0.0), Segment::Blend { index: 0, factor: 0.0 });
        assert_eq!(track.locate(1.0), Segment::Blend { index: 0, factor: 0.5 });
        assert_eq!(track.locate(2.0), Segment::Blend { index: 1, factor: 0.0 });
        match track.locate(5.0) {
            Segment::Blend { index, factor } => {
                assert_eq!(index, 1);
                assert!((factor - 0.75).abs() < 1e-6);
            }
            other => panic!("unexpected segment {other:?}"),
        }
    }

    #[test]
    fn factor_stays_below_one_just_before_next_key() {
        let track = vec3_track(&[(0.3, Vec3::ZERO), (1.4, Vec3::X)]);
        let just_before = f32::from_bits(1.4_f32.to_bits() - 1);
        match track.locate(just_before) {
            Segment::Blend { index, factor } => {
                assert_eq!(index, 0);
                assert!((0.0..1.0).contains(&factor), "factor {factor} escaped [0, 1)");
            }
            other => panic!("unexpected segment {other:?}"),
        }
    }

    #[test]
    fn out_of_range_times_clamp() {
        let track = vec3_track(&[(1.0, Vec3::ZERO), (2.0, Vec3::X)]);
        assert_eq!(track.locate(2.0), Segment::Hold(1));
        assert_eq!(track.locate(40.0), Segment::Hold(1));
        assert_eq!(track.locate(0.5), Segment::Hold(0));
        assert_eq!(track.locate(f32::NAN), Segment::Hold(0));
        assert_eq!(track.sample(40.0), Vec3::X);
    }

    #[test]
    fn step_interpolation_holds_previous_key() {
        let raw = [SourceKey::new(0.0, Vec3::ZERO), SourceKey::new(1.0, Vec3::ONE)];
        let track = build_track("bone", ChannelKind::Scale, Interpolation::Step, &raw).expect("track");
        assert_eq!(track.sample(0.99), Vec3::ZERO);
        assert_eq!(track.sample(1.0), Vec3::ONE);
    }

    #[test]
    fn build_sorts_and_deduplicates() {
        let track = vec3_track(&[(2.0, Vec3::Y), (0.0, Vec3::ZERO), (2.0, Vec3::Z)]);
        let times: Vec<f32> = track.keyframes.iter().map(|kf| kf.time).collect();
        assert_eq!(times, vec![0.0, 2.0]);
        assert_eq!(track.keyframes[1].value, Vec3::Z);
    }

    #[test]
    fn close_but_distinct_keys_survive() {
        let tiny = f32::EPSILON / 4.0;
        let track = vec3_track(&[(0.0, Vec3::ZERO), (tiny, Vec3::X), (5000.0, Vec3::Y), (5000.0, Vec3::Z)]);
        let times: Vec<f32> = track.keyframes.iter().map(|kf| kf.time).collect();
        assert_eq!(times, vec![0.0, tiny, 5000.0]);
        assert_eq!(track.keyframes[2].value, Vec3::Z);
    }

    #[test]
    fn build_rejects_bad_keys() {
        let empty: [SourceKey<Vec3>; 0] = [];
        assert!(matches!(
            build_track("hips", ChannelKind::Position, Interpolation::Linear, &empty),
            Err(SkeletalLoadError::EmptyKeyframes { .. })
        ));
        let nan = [SourceKey::new(0.0, Vec3::new(f32::NAN, 0.0, 0.0))];
        assert!(matches!(
            build_track("hips", ChannelKind::Position, Interpolation::Linear, &nan),
            Err(SkeletalLoadError::NonFiniteKeyframe { .. })
        ));
        let negative = [SourceKey::new(-1.0, Vec3::ZERO)];
        assert!(matches!(
            build_track("hips", ChannelKind::Position, Interpolation::Linear, &negative),
            Err(SkeletalLoadError::NegativeKeyframeTime { .. })
        ));
    }

    #[test]
    fn zero_length_rotations_become_identity() {
        let raw = [SourceKey::new(0.0, Quat::from_xyzw(0.0, 0.0, 0.0, 0.0))];
        let track = build_track("hips", ChannelKind::Rotation, Interpolation::Linear, &raw).expect("track");
        assert_eq!(track.keyframes[0].value, Quat::IDENTITY);
    }
}

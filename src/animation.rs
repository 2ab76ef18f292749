//! Step-by-step vehicle marker animation along a route

use serde::Serialize;

use crate::models::{LatLng, RouteStep, VehicleType};

/// One marker position
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnimationFrame {
    pub step_index: usize,
    pub point_index: usize,
    pub position: LatLng,
    /// Distance covered since the first frame, in metres
    pub travelled_m: f64,
    pub icon: &'static str,
}

/// Iterator over the path points of every step, in route order
pub struct VehicleAnimation<'a> {
    steps: &'a [RouteStep],
    icon: &'static str,
    step_index: usize,
    point_index: usize,
    last: Option<LatLng>,
    travelled_m: f64,
}

impl<'a> VehicleAnimation<'a> {
    #[must_use]
    pub fn new(steps: &'a [RouteStep], vehicle: VehicleType) -> Self {
        Self {
            steps,
            icon: vehicle.icon(),
            step_index: 0,
            point_index: 0,
            last: None,
            travelled_m: 0.0,
        }
    }
}

impl Iterator for VehicleAnimation<'_> {
    type Item = AnimationFrame;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let step = self.steps.get(self.step_index)?;
            let Some(&position) = step.path.get(self.point_index) else {
                self.step_index += 1;
                self.point_index = 0;
                continue;
            };

            if let Some(last) = self.last {
                self.travelled_m += last.distance_m(&position);
            }
            self.last = Some(position);

            let frame = AnimationFrame {
                step_index: self.step_index,
                point_index: self.point_index,
                position,
                travelled_m: self.travelled_m,
                icon: self.icon,
            };
            self.point_index += 1;
            return Some(frame);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TextValue;
    use crate::models::route::fixtures::candidate;

    #[test]
    fn test_one_frame_per_point() {
        let route = candidate(3_000.0, 600.0, None);
        let frames: Vec<AnimationFrame> =
            VehicleAnimation::new(&route.steps, VehicleType::CargoSmall).collect();

        assert_eq!(frames.len(), 4);
        let indices: Vec<(usize, usize)> =
            frames.iter().map(|f| (f.step_index, f.point_index)).collect();
        assert_eq!(indices, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
        assert!(frames.iter().all(|f| f.icon == "🚐"));
        assert_eq!(frames[0].travelled_m, 0.0);
    }

    #[test]
    fn test_travelled_distance_accumulates() {
        let route = candidate(3_000.0, 600.0, None);
        let frames: Vec<AnimationFrame> =
            VehicleAnimation::new(&route.steps, VehicleType::Driving).collect();

        for pair in frames.windows(2) {
            assert!(pair[1].travelled_m >= pair[0].travelled_m);
        }
        // Both steps share their junction point, which adds no distance
        assert_eq!(frames[1].travelled_m, frames[2].travelled_m);

        let start = route.steps[0].path[0];
        let end = route.steps[1].path[1];
        let total = frames[3].travelled_m;
        assert!(total >= start.distance_m(&end) - 1e-6);
    }

    #[test]
    fn test_empty_steps_are_skipped() {
        let point = LatLng::new(1.0, 2.0);
        let steps = vec![
            RouteStep {
                instructions: None,
                distance: TextValue::new(0.0, "0 m"),
                duration: TextValue::new(0.0, "0 mins"),
                path: vec![],
            },
            RouteStep {
                instructions: None,
                distance: TextValue::new(0.0, "0 m"),
                duration: TextValue::new(0.0, "0 mins"),
                path: vec![point],
            },
        ];
        let frames: Vec<AnimationFrame> = VehicleAnimation::new(&steps, VehicleType::Walking).collect();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].step_index, 1);
        assert_eq!(frames[0].position, point);
    }

    #[test]
    fn test_no_steps_no_frames() {
        assert_eq!(VehicleAnimation::new(&[], VehicleType::Driving).count(), 0);
    }
}

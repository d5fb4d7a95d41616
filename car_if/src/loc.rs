//! # Localisation and Perception Interfaces

/// Visual localisation against the periodic ceiling pattern.
pub trait CeilingTracker: Send {
    /// Refine `xytheta` (homogeneous ceiling coordinates and heading) using `image`.
    ///
    /// - `threshold`: luminance threshold for ceiling light pixels
    /// - `x_grid`, `y_grid`: pattern spacing in homogeneous units
    /// - `n_iter`: number of refinement iterations
    /// - `coarse`: whether to run the coarse search first
    fn update(
        &mut self,
        image: &[u8],
        threshold: u8,
        x_grid: f32,
        y_grid: f32,
        xytheta: &mut [f32; 3],
        n_iter: u32,
        coarse: bool
    );
}

/// Obstacle detection, producing one penalty map per obstacle class.
pub trait ObstacleDetector: Send {
    /// Run detection on `image`.
    fn update(&mut self, image: &[u8], car_threshold: i32, cone_threshold: i32);

    /// Penalty map for other cars.
    fn car_penalties(&self) -> &[i32];

    /// Penalty map for cones.
    fn cone_penalties(&self) -> &[i32];
}

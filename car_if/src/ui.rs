//! # Display Interface

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// RGB565 status colours
pub const COLOR_WHITE: u16 = 0xffff;
pub const COLOR_YELLOW: u16 = 0xffe0;
pub const COLOR_GREEN: u16 = 0x07e0;
pub const COLOR_RED: u16 = 0xf800;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// The on-car display.
pub trait Display: Send {
    /// Show a one line status message.
    fn update_status(&mut self, message: &str, color: u16);

    /// Show the configuration table with the cursor on `cursor`.
    fn update_config(&mut self, names: &[&str], cursor: usize, values: &[i16]);

    /// Show the car's position on the live map.
    ///
    /// `xytheta` is in ground coordinates, the grid spacing and map extent are in meters.
    fn update_ceiltrack_view(
        &mut self,
        xytheta: &[f32; 3],
        x_grid_m: f32,
        y_grid_m: f32,
        map_width_m: f32,
        map_height_m: f32
    );
}

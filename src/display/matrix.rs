//! Real panel output through the rpi-rgb-led-matrix bindings.
//!
//! Needs root (or the right GPIO permissions) on a Raspberry Pi.

use rpi_led_matrix::{LedCanvas, LedColor, LedMatrix, LedMatrixOptions};
use tracing::info;

use super::{Frame, FrameSink, MATRIX_SIZE};
use crate::error::DisplayError;

// Panel tuning for a single 64x64 P3 panel mounted sideways
const PIXEL_MAPPER: &str = "Rotate:90";
const PWM_BITS: u8 = 5;
const PWM_LSB_NANOSECONDS: u32 = 90;
const SCAN_MODE: u32 = 1;
const REFRESH_LIMIT_HZ: u32 = 100;

pub struct LedMatrixSink {
    matrix: LedMatrix,
    // Double buffer: draw here, then swap onto the panel
    canvas: Option<LedCanvas>,
}

impl LedMatrixSink {
    pub fn new(hardware_mapping: &str, brightness: u8) -> Result<Self, DisplayError> {
        let mut options = LedMatrixOptions::new();
        options.set_rows(MATRIX_SIZE);
        options.set_cols(MATRIX_SIZE);
        options.set_chain_length(1);
        options.set_parallel(1);
        options.set_hardware_mapping(hardware_mapping);
        options.set_pixel_mapper_config(PIXEL_MAPPER);
        options.set_pwm_lsb_nanoseconds(PWM_LSB_NANOSECONDS);
        options
            .set_pwm_bits(PWM_BITS)
            .map_err(|e| DisplayError::Driver(e.to_string()))?;
        options
            .set_brightness(brightness)
            .map_err(|e| DisplayError::Driver(e.to_string()))?;
        options.set_scan_mode(SCAN_MODE);
        options.set_refresh_rate(false);
        options.set_limit_refresh(REFRESH_LIMIT_HZ);

        let matrix =
            LedMatrix::new(Some(options), None).map_err(|e| DisplayError::Driver(e.to_string()))?;
        let canvas = Some(matrix.offscreen_canvas());

        info!(hardware_mapping, brightness, "LED matrix initialized");
        Ok(Self { matrix, canvas })
    }
}

impl FrameSink for LedMatrixSink {
    fn show(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        let mut canvas = self
            .canvas
            .take()
            .unwrap_or_else(|| self.matrix.offscreen_canvas());

        canvas.clear();
        for (y, row) in frame.pixels.iter().enumerate() {
            for (x, &(red, green, blue)) in row.iter().enumerate() {
                canvas.set(x as i32, y as i32, &LedColor { red, green, blue });
            }
        }

        self.canvas = Some(self.matrix.swap(canvas));
        Ok(())
    }
}

//! Region parsing functions for ROI, drag gestures and display sizes.

use lfa_core::{PixelRect, Point};

/// Parse ROI string in format "x,y,width,height"
///
/// # Returns
/// A pixel rectangle in native image coordinates
pub fn parse_roi(roi_str: &str) -> Result<PixelRect, String> {
    let parts: Vec<&str> = roi_str.split(',').collect();
    if parts.len() != 4 {
        return Err(format!(
            "ROI must be in format x,y,width,height, got: {}",
            roi_str
        ));
    }

    let x = parts[0]
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("Invalid x coordinate: {}", parts[0]))?;
    let y = parts[1]
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("Invalid y coordinate: {}", parts[1]))?;
    let width = parts[2]
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("Invalid width: {}", parts[2]))?;
    let height = parts[3]
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("Invalid height: {}", parts[3]))?;

    Ok(PixelRect::new(x, y, width, height))
}

/// Parse a drag gesture in format "x0,y0:x1,y1" (display coordinates)
///
/// The first point is where the pointer went down, the second where it was
/// released. Either may be the top-left corner.
pub fn parse_drag(drag_str: &str) -> Result<(Point, Point), String> {
    let (start, end) = drag_str
        .split_once(':')
        .ok_or_else(|| format!("Drag must be in format x0,y0:x1,y1, got: {}", drag_str))?;
    Ok((parse_point(start)?, parse_point(end)?))
}

/// Parse a display size in format "WIDTHxHEIGHT"
pub fn parse_display(display_str: &str) -> Result<(f64, f64), String> {
    let (w, h) = display_str
        .to_lowercase()
        .split_once('x')
        .map(|(w, h)| (w.trim().to_string(), h.trim().to_string()))
        .ok_or_else(|| {
            format!(
                "Display size must be in format WIDTHxHEIGHT, got: {}",
                display_str
            )
        })?;

    let width = w
        .parse::<f64>()
        .map_err(|_| format!("Invalid display width: {}", w))?;
    let height = h
        .parse::<f64>()
        .map_err(|_| format!("Invalid display height: {}", h))?;

    if !(width > 0.0 && height > 0.0) {
        return Err(format!(
            "Display size must be positive, got: {}x{}",
            width, height
        ));
    }
    Ok((width, height))
}

fn parse_point(point_str: &str) -> Result<Point, String> {
    let (x, y) = point_str
        .split_once(',')
        .ok_or_else(|| format!("Point must be in format x,y, got: {}", point_str))?;
    let x = x
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("Invalid x coordinate: {}", x))?;
    let y = y
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("Invalid y coordinate: {}", y))?;
    Ok(Point::new(x, y))
}

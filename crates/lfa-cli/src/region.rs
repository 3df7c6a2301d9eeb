//! Region selection from command line arguments.

use lfa_core::{AnalysisWorkspace, PixelRect, Point, SelectionRect};

use crate::parsers::{parse_display, parse_drag, parse_roi};

/// How the operator described the region to crop.
#[derive(Debug, Clone, PartialEq)]
pub enum RegionSpec {
    /// Rectangle in native pixels
    Native(PixelRect),
    /// Pointer gesture on a preview of the given display size
    Drag {
        start: Point,
        end: Point,
        display: Option<(f64, f64)>,
    },
}

impl RegionSpec {
    /// Build from the `--roi`, `--drag` and `--display` options.
    pub fn from_args(
        roi: Option<&str>,
        drag: Option<&str>,
        display: Option<&str>,
    ) -> Result<Option<Self>, String> {
        match (roi, drag) {
            (Some(_), Some(_)) => Err("Use either --roi or --drag, not both".to_string()),
            (Some(roi), None) => {
                if display.is_some() {
                    return Err("--display only applies to --drag".to_string());
                }
                Ok(Some(RegionSpec::Native(parse_roi(roi)?)))
            }
            (None, Some(drag)) => {
                let (start, end) = parse_drag(drag)?;
                let display = display.map(parse_display).transpose()?;
                Ok(Some(RegionSpec::Drag {
                    start,
                    end,
                    display,
                }))
            }
            (None, None) if display.is_some() => {
                Err("--display only applies to --drag".to_string())
            }
            (None, None) => Ok(None),
        }
    }

    /// Select this region in `workspace` and crop it.
    pub fn apply(&self, workspace: &mut AnalysisWorkspace) -> lfa_core::Result<()> {
        match self {
            RegionSpec::Native(rect) => {
                workspace.select_native(SelectionRect::from_pixels(*rect))?;
            }
            RegionSpec::Drag {
                start,
                end,
                display,
            } => {
                if let Some((width, height)) = display {
                    workspace.resize_display(0.0, 0.0, *width, *height)?;
                }
                workspace.press(*start)?;
                workspace.release(*end)?;
            }
        }

        if let Some(rect) = workspace.selection().committed() {
            log::debug!(
                "native selection x={:.1} y={:.1} w={:.1} h={:.1}",
                rect.x,
                rect.y,
                rect.width,
                rect.height
            );
        }
        workspace.apply_crop()?;
        Ok(())
    }
}

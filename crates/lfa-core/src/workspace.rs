//! Analysis workspace
//!
//! Owns the active image, the display transform, the ROI selection and the
//! optional cropped region. All mutation happens through explicit events so a
//! sequence of pointer actions can be replayed deterministically.

use crate::classification::{
    ClassificationResult, ClassificationSession, ImageVariant, InferenceEngine,
};
use crate::decoders::DecodedImage;
use crate::error::{LfaError, Result};
use crate::extraction;
use crate::geometry::{to_native, DisplayTransform, Point, SurfaceBounds};
use crate::selection::{SelectionRect, SelectionTracker};

/// Active image plus the state derived from it.
#[derive(Debug, Clone, Default)]
pub struct AnalysisWorkspace {
    image: Option<LoadedImage>,
    selection: SelectionTracker,
    cropped: Option<DecodedImage>,
}

#[derive(Debug, Clone)]
struct LoadedImage {
    name: String,
    image: DecodedImage,
    surface: SurfaceBounds,
}

impl AnalysisWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the active image. Any selection and crop are discarded and the
    /// display surface is reset to native size.
    pub fn load_image(&mut self, name: impl Into<String>, image: DecodedImage) {
        let name = name.into();
        log::info!("loaded {} ({}x{})", name, image.width, image.height);
        let surface = SurfaceBounds::at_origin(
            image.width as f64,
            image.height as f64,
            image.width,
            image.height,
        );
        self.image = Some(LoadedImage {
            name,
            image,
            surface,
        });
        self.selection.clear();
        self.cropped = None;
    }

    /// Name of the active image.
    pub fn image_name(&self) -> Option<&str> {
        self.image.as_ref().map(|l| l.name.as_str())
    }

    pub fn original(&self) -> Option<&DecodedImage> {
        self.image.as_ref().map(|l| &l.image)
    }

    pub fn cropped(&self) -> Option<&DecodedImage> {
        self.cropped.as_ref()
    }

    /// Update where the image is drawn on screen.
    pub fn resize_display(&mut self, left: f64, top: f64, width: f64, height: f64) -> Result<()> {
        let loaded = self.loaded_mut()?;
        let surface = SurfaceBounds {
            left,
            top,
            width,
            height,
            buffer_width: loaded.image.width,
            buffer_height: loaded.image.height,
        };
        surface.transform()?;
        loaded.surface = surface;
        Ok(())
    }

    /// Scale factors of the current display surface.
    pub fn display_transform(&self) -> Result<DisplayTransform> {
        self.loaded()?.surface.transform()
    }

    /// Pointer pressed at a display position.
    pub fn press(&mut self, pointer: Point) -> Result<()> {
        let point = self.map_pointer(pointer)?;
        self.selection.start(point);
        Ok(())
    }

    /// Pointer moved to a display position.
    pub fn drag(&mut self, pointer: Point) -> Result<()> {
        let point = self.map_pointer(pointer)?;
        self.selection.update(point);
        Ok(())
    }

    /// Pointer released at a display position.
    pub fn release(&mut self, pointer: Point) -> Result<()> {
        self.drag(pointer)?;
        self.selection.finish();
        Ok(())
    }

    /// Abandon the current selection.
    pub fn cancel_selection(&mut self) {
        self.selection.clear();
    }

    pub fn selection(&self) -> &SelectionTracker {
        &self.selection
    }

    /// Commit a selection given directly in native coordinates.
    pub fn select_native(&mut self, rect: SelectionRect) -> Result<()> {
        self.loaded()?;
        self.selection.start(rect.min_corner());
        self.selection.update(rect.max_corner());
        self.selection.finish();
        Ok(())
    }

    /// Crop the committed selection out of the original image.
    ///
    /// On success the selection is discarded and the crop becomes the image
    /// used for classification. On failure nothing changes.
    pub fn apply_crop(&mut self) -> Result<&DecodedImage> {
        let rect = self.selection.committed().ok_or(LfaError::EmptySelection)?;
        let region = extraction::extract(&self.loaded()?.image, &rect)?;
        self.selection.clear();
        let stored: &DecodedImage = self.cropped.insert(region);
        Ok(stored)
    }

    /// Drop the crop and go back to the original image.
    pub fn reset_crop(&mut self) {
        self.cropped = None;
        self.selection.clear();
    }

    /// Image that a classification should run on: the crop if one exists.
    pub fn current_image(&self) -> Option<(&DecodedImage, ImageVariant)> {
        match (&self.cropped, &self.image) {
            (Some(crop), _) => Some((crop, ImageVariant::Cropped)),
            (None, Some(loaded)) => Some((&loaded.image, ImageVariant::Original)),
            (None, None) => None,
        }
    }

    /// Classify the current image with `session`.
    pub fn classify<'s>(
        &self,
        session: &'s mut ClassificationSession,
        engine: &dyn InferenceEngine,
    ) -> Result<&'s ClassificationResult> {
        let (image, variant) = self.current_image().ok_or(LfaError::InvalidTransition {
            state: "no image is loaded",
            action: "classify",
        })?;
        session.classify(image, variant, engine)
    }

    fn map_pointer(&self, pointer: Point) -> Result<Point> {
        to_native(pointer, &self.loaded()?.surface)
    }

    fn loaded(&self) -> Result<&LoadedImage> {
        self.image.as_ref().ok_or(LfaError::InvalidTransition {
            state: "no image is loaded",
            action: "use the selection tools",
        })
    }

    fn loaded_mut(&mut self) -> Result<&mut LoadedImage> {
        self.image.as_mut().ok_or(LfaError::InvalidTransition {
            state: "no image is loaded",
            action: "resize the display",
        })
    }
}

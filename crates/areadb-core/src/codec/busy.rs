// crates/areadb-core/src/codec/busy.rs
//! Busy indication around slow encoders.

/// Something a front end can show while an export is running.
pub trait BusyIndicator {
    fn begin(&self);
    fn end(&self);
}

/// Indicator that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBusy;

impl BusyIndicator for NoBusy {
    fn begin(&self) {}
    fn end(&self) {}
}

/// Raises the indicator on creation and clears it on drop, so an encoder
/// that fails with `?` still leaves the indicator cleared.
pub struct BusyGuard<'a> {
    indicator: &'a dyn BusyIndicator,
}

impl<'a> BusyGuard<'a> {
    pub fn acquire(indicator: &'a dyn BusyIndicator) -> Self {
        indicator.begin();
        BusyGuard { indicator }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.indicator.end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Capabilities, Dispatcher, ExportOptions, Format};
    use crate::geometry::{Feature, FeatureCollection, Geometry, Position};
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        events: RefCell<Vec<&'static str>>,
    }

    impl BusyIndicator for Recorder {
        fn begin(&self) {
            self.events.borrow_mut().push("begin");
        }
        fn end(&self) {
            self.events.borrow_mut().push("end");
        }
    }

    #[test]
    fn shapefile_export_is_bracketed() {
        let recorder = Recorder::default();
        let dispatcher = Dispatcher::new(Capabilities::full()).with_busy_indicator(&recorder);
        let model = FeatureCollection::from_features(vec![Feature::new(Geometry::point(1.0, 2.0))]);

        dispatcher
            .export(Format::Shapefile, &model, &ExportOptions::default())
            .unwrap();
        assert_eq!(*recorder.events.borrow(), vec!["begin", "end"]);
    }

    #[test]
    fn indicator_is_cleared_when_export_fails() {
        let recorder = Recorder::default();
        let dispatcher = Dispatcher::new(Capabilities::full()).with_busy_indicator(&recorder);
        // Only an empty line: nothing the shapefile writer can store.
        let model = FeatureCollection::from_features(vec![Feature::new(Geometry::line_string(
            Vec::<Position>::new(),
        ))]);

        assert!(dispatcher
            .export(Format::Shapefile, &model, &ExportOptions::default())
            .is_err());
        assert_eq!(*recorder.events.borrow(), vec!["begin", "end"]);
    }

    #[test]
    fn text_formats_do_not_touch_the_indicator() {
        let recorder = Recorder::default();
        let dispatcher = Dispatcher::default().with_busy_indicator(&recorder);
        dispatcher
            .export(Format::GeoJson, &FeatureCollection::new(), &ExportOptions::default())
            .unwrap();
        assert!(recorder.events.borrow().is_empty());
    }
}

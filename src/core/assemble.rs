use crate::core::{ArtworkCache, Document, Page, PageCanvas};
use crate::utils::error::{Result, SheetError};
use crate::utils::observer::{PipelineEvent, PipelineObserver};
use std::sync::Arc;

/// Draws a laid-out [`Document`] onto a [`PageCanvas`].
pub struct PageAssembler {
    observer: Arc<dyn PipelineObserver>,
}

impl PageAssembler {
    pub fn new(observer: Arc<dyn PipelineObserver>) -> Self {
        Self { observer }
    }

    /// One canvas page per non-empty document page, ascending by index.
    /// Only the canvas itself can make this fail once there is something
    /// to draw.
    pub fn assemble<C: PageCanvas>(
        &self,
        mut canvas: C,
        document: &Document,
        images: &ArtworkCache,
    ) -> Result<Vec<u8>> {
        let mut pages: Vec<&Page> = document
            .pages
            .iter()
            .filter(|page| !page.placements.is_empty())
            .collect();

        if pages.is_empty() {
            return Err(SheetError::SinkFailure {
                message: "document has no placements to render".to_string(),
            });
        }
        pages.sort_by_key(|page| page.index);

        for page in pages {
            canvas.begin_page(page.index)?;
            for placement in &page.placements {
                let artwork = images.get(&placement.key).ok_or_else(|| SheetError::Internal {
                    message: format!("placement refers to uncached artwork '{}'", placement.key),
                })?;
                canvas.draw_image(
                    artwork,
                    placement.x,
                    placement.y,
                    placement.width,
                    placement.height,
                )?;
            }
            self.observer.on_event(&PipelineEvent::PageEmitted {
                index: page.index,
                placements: page.placements.len(),
            });
        }

        canvas.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::layout::{layout, GridLayout};
    use crate::core::normalize::normalize;
    use crate::core::{CardRequest, PageSize, Placement, ResolvedArtwork};
    use crate::test_helpers::cache_with;
    use crate::utils::observer::RecordingObserver;

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Begin(usize),
        Draw(String, f64, f64),
    }

    #[derive(Default)]
    struct RecordingCanvas {
        ops: Vec<Op>,
        fail_on_finish: bool,
    }

    impl PageCanvas for &mut RecordingCanvas {
        fn begin_page(&mut self, index: usize) -> Result<()> {
            self.ops.push(Op::Begin(index));
            Ok(())
        }

        fn draw_image(
            &mut self,
            artwork: &ResolvedArtwork,
            x: f64,
            y: f64,
            _width: f64,
            _height: f64,
        ) -> Result<()> {
            self.ops
                .push(Op::Draw(artwork.key.as_str().to_string(), x, y));
            Ok(())
        }

        fn finish(self) -> Result<Vec<u8>> {
            if self.fail_on_finish {
                return Err(SheetError::SinkFailure {
                    message: "out of memory".to_string(),
                });
            }
            Ok(format!("{} ops", self.ops.len()).into_bytes())
        }
    }

    fn placement(key: &str, page_index: usize, x: f64) -> Placement {
        Placement {
            key: normalize(key),
            page_index,
            row: 0,
            col: 0,
            x,
            y: 0.0,
            width: 10.0,
            height: 10.0,
        }
    }

    #[test]
    fn test_pages_are_emitted_in_order() {
        let images = cache_with(&["a", "b"]);
        let document = layout(
            &[CardRequest::new("A", 9), CardRequest::new("B", 2)],
            &images,
            &GridLayout::standard(),
        );
        let observer = Arc::new(RecordingObserver::new());
        let mut canvas = RecordingCanvas::default();

        let bytes = PageAssembler::new(observer.clone())
            .assemble(&mut canvas, &document, &images)
            .unwrap();

        assert_eq!(bytes, b"13 ops".to_vec());
        assert_eq!(canvas.ops[0], Op::Begin(0));
        assert_eq!(canvas.ops[1], Op::Draw("a".to_string(), 10.5, 16.5));
        assert_eq!(canvas.ops[10], Op::Begin(1));
        assert_eq!(canvas.ops[11], Op::Draw("b".to_string(), 10.5, 16.5));
        assert_eq!(canvas.ops[12], Op::Draw("b".to_string(), 73.5, 16.5));

        assert_eq!(
            observer
                .events()
                .into_iter()
                .filter(|e| matches!(e, PipelineEvent::PageEmitted { .. }))
                .collect::<Vec<_>>(),
            vec![
                PipelineEvent::PageEmitted {
                    index: 0,
                    placements: 9
                },
                PipelineEvent::PageEmitted {
                    index: 1,
                    placements: 2
                },
            ]
        );
    }

    #[test]
    fn test_unsorted_and_empty_pages() {
        let images = cache_with(&["a", "b"]);
        let document = Document {
            page_size: PageSize::A4,
            pages: vec![
                Page {
                    index: 2,
                    placements: vec![placement("b", 2, 1.0)],
                },
                Page {
                    index: 1,
                    placements: vec![],
                },
                Page {
                    index: 0,
                    placements: vec![placement("a", 0, 2.0)],
                },
            ],
        };
        let mut canvas = RecordingCanvas::default();

        PageAssembler::new(Arc::new(RecordingObserver::new()))
            .assemble(&mut canvas, &document, &images)
            .unwrap();

        assert_eq!(
            canvas.ops,
            vec![
                Op::Begin(0),
                Op::Draw("a".to_string(), 2.0, 0.0),
                Op::Begin(2),
                Op::Draw("b".to_string(), 1.0, 0.0),
            ]
        );
    }

    #[test]
    fn test_empty_document_is_refused() {
        let images = cache_with(&["a"]);
        let document = Document {
            page_size: PageSize::A4,
            pages: vec![],
        };
        let mut canvas = RecordingCanvas::default();

        let result = PageAssembler::new(Arc::new(RecordingObserver::new()))
            .assemble(&mut canvas, &document, &images);

        assert!(matches!(result, Err(SheetError::SinkFailure { .. })));
        assert!(canvas.ops.is_empty());
    }

    #[test]
    fn test_canvas_failure_is_sink_failure() {
        let images = cache_with(&["a"]);
        let document = layout(&[CardRequest::new("A", 1)], &images, &GridLayout::standard());
        let mut canvas = RecordingCanvas {
            fail_on_finish: true,
            ..RecordingCanvas::default()
        };

        let result = PageAssembler::new(Arc::new(RecordingObserver::new()))
            .assemble(&mut canvas, &document, &images);

        assert!(matches!(result, Err(SheetError::SinkFailure { .. })));
    }

    #[test]
    fn test_uncached_placement_is_internal_error() {
        let images = cache_with(&["a"]);
        let document = Document {
            page_size: PageSize::A4,
            pages: vec![Page {
                index: 0,
                placements: vec![placement("ghost", 0, 0.0)],
            }],
        };
        let mut canvas = RecordingCanvas::default();

        let result = PageAssembler::new(Arc::new(RecordingObserver::new()))
            .assemble(&mut canvas, &document, &images);

        assert!(matches!(result, Err(SheetError::Internal { .. })));
    }
}

use smol_str::SmolStr;
use tincture_core::PdfError;
use tincture_core::document::Page;
use tincture_core::interp::{
    ColorDevice, ColorTraceDevice, InitialState, InterpretOptions, OperandCheck, OperatorRegistry,
    PageInterpreter, UnsupportedPolicy,
};
use tincture_core::model::{
    CancellationToken, Color, ColorSpace, ColorTarget, GraphicState, ResourceDictionary,
};

fn defaults() -> InterpretOptions {
    InterpretOptions {
        initial_state: InitialState::DeviceDefaults,
        ..Default::default()
    }
}

/// Device counting page brackets, to check process_page calls them.
#[derive(Default)]
struct PageCounter {
    begun: Vec<(u32, [f64; 4])>,
    ended: Vec<u32>,
    updates: usize,
}

impl ColorDevice for PageCounter {
    fn begin_page(&mut self, pageid: u32, mediabox: [f64; 4]) {
        self.begun.push((pageid, mediabox));
    }

    fn end_page(&mut self, pageid: u32) {
        self.ended.push(pageid);
    }

    fn update_color(
        &mut self,
        _pos: usize,
        _operator: &str,
        _target: ColorTarget,
        _state: &GraphicState,
    ) {
        self.updates += 1;
    }
}

#[test]
fn test_trace_records_changes_in_order() {
    let registry = OperatorRegistry::standard();
    let mut device = ColorTraceDevice::new();
    let page = Page::new(7, b"/DeviceRGB CS 1 0 0 SC 0.5 g".to_vec());

    {
        let mut interp = PageInterpreter::new(&registry, &mut device, defaults());
        let report = interp.process_page(&page).unwrap();
        assert_eq!(report.applied, 3);
        assert!(report.is_clean());
    }

    let events = device.events();
    let summary: Vec<(usize, &str, ColorTarget)> = events
        .iter()
        .map(|e| (e.pos, e.operator.as_str(), e.target))
        .collect();
    assert_eq!(
        summary,
        vec![
            (11, "CS", ColorTarget::Stroke),
            (20, "SC", ColorTarget::Stroke),
            (27, "g", ColorTarget::NonStroke),
        ]
    );
    assert!(events.iter().all(|e| e.pageid == 7));
    assert_eq!(events[0].color, Some(Color::Rgb(0.0, 0.0, 0.0)));
    assert_eq!(events[1].color, Some(Color::Rgb(1.0, 0.0, 0.0)));
    assert_eq!(events[2].space, Some(ColorSpace::DeviceGray));
}

#[test]
fn test_restore_reports_both_targets() {
    let registry = OperatorRegistry::standard();
    let mut device = ColorTraceDevice::new();
    let page = Page::new(1, b"q 1 0 0 rg 0 0 1 RG Q".to_vec());

    let mut interp = PageInterpreter::new(&registry, &mut device, defaults());
    interp.process_page(&page).unwrap();
    assert_eq!(interp.ctx().non_stroke_color(), Some(&Color::Gray(0.0)));
    assert_eq!(interp.ctx().stroke_color(), Some(&Color::Gray(0.0)));
    drop(interp);

    let restored: Vec<_> = device
        .events()
        .iter()
        .filter(|e| e.operator == "Q")
        .map(|e| (e.target, e.color.clone()))
        .collect();
    assert_eq!(
        restored,
        vec![
            (ColorTarget::Stroke, Some(Color::Gray(0.0))),
            (ColorTarget::NonStroke, Some(Color::Gray(0.0))),
        ]
    );
}

#[test]
fn test_process_page_brackets_device() {
    let registry = OperatorRegistry::standard();
    let mut device = PageCounter::default();
    {
        let mut interp = PageInterpreter::new(&registry, &mut device, InterpretOptions::default());
        interp.process_page(&Page::new(1, b"0 g".to_vec())).unwrap();
        let page = Page::new(2, b"1 G".to_vec()).with_mediabox([0.0, 0.0, 595.0, 842.0]);
        interp.process_page(&page).unwrap();
    }
    assert_eq!(
        device.begun,
        vec![
            (1, [0.0, 0.0, 612.0, 792.0]),
            (2, [0.0, 0.0, 595.0, 842.0])
        ]
    );
    assert_eq!(device.ended, vec![1, 2]);
    assert_eq!(device.updates, 2);
}

/// Test: a second page does not inherit the first page's colors.
#[test]
fn test_context_reset_between_pages() {
    let registry = OperatorRegistry::standard();
    let mut device = ColorTraceDevice::new();
    let mut interp = PageInterpreter::new(&registry, &mut device, InterpretOptions::default());

    interp
        .process_page(&Page::new(1, b"q /DeviceCMYK cs".to_vec()))
        .unwrap();
    assert_eq!(interp.ctx().stack_depth(), 1);

    let report = interp.process_page(&Page::new(2, b"0.5 sc".to_vec())).unwrap();
    assert_eq!(interp.ctx().stack_depth(), 0);
    assert!(matches!(
        report.failures[0].error,
        PdfError::ColorSpaceNotSet { operator: "sc" }
    ));
}

/// Test: operands given to an operator in an unresolved space are
/// dropped and the operator is skipped, however operand counts are checked.
#[test]
fn test_unresolved_space_with_operands() {
    let page = Page::new(1, b"/CS7 cs 0.1 0.2 0.3 scn 0.5 g".to_vec());
    let registry = OperatorRegistry::standard();

    for operand_check in [OperandCheck::Strict, OperandCheck::Lenient] {
        let options = InterpretOptions {
            operand_check,
            ..defaults()
        };
        let mut device = ColorTraceDevice::new();
        let mut interp = PageInterpreter::new(&registry, &mut device, options);
        let report = interp.process_page(&page).unwrap();

        assert!(report.failures.is_empty(), "{operand_check:?}");
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].operator, "scn");
        assert_eq!(report.skipped[0].pos, 20);
        assert_eq!(
            report.skipped[0].space,
            ColorSpace::Unsupported(SmolStr::new("CS7"))
        );
        assert_eq!(interp.ctx().non_stroke_color(), Some(&Color::Gray(0.5)));
    }
}

/// Test: the error policy applies to operators with operands too.
#[test]
fn test_unresolved_space_with_operands_error_policy() {
    let page = Page::new(1, b"/CS7 cs 0.1 0.2 0.3 scn".to_vec());
    let registry = OperatorRegistry::standard();
    let mut device = ColorTraceDevice::new();
    let options = InterpretOptions {
        unsupported: UnsupportedPolicy::Error,
        ..defaults()
    };
    let mut interp = PageInterpreter::new(&registry, &mut device, options);

    let report = interp.process_page(&page).unwrap();
    assert!(report.skipped.is_empty());
    assert_eq!(report.failures.len(), 1);
    match &report.failures[0].error {
        PdfError::UnsupportedColorSpace { operator, space } => {
            assert_eq!(*operator, "scn");
            assert_eq!(space, "Unsupported(CS7)");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

/// Test: SC with components in an ICCBased space is skipped, not miscounted.
#[test]
fn test_basic_operator_outside_family_with_operands() {
    let resources =
        ResourceDictionary::new().with_color_space("CS0", ColorSpace::IccBased { components: 3 });
    let page = Page::new(1, b"/CS0 CS 1 0 0 SC".to_vec()).with_resources(resources);
    let registry = OperatorRegistry::standard();
    let mut device = ColorTraceDevice::new();
    let mut interp = PageInterpreter::new(&registry, &mut device, defaults());

    let report = interp.process_page(&page).unwrap();
    assert!(report.failures.is_empty());
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].operator, "SC");
    assert_eq!(interp.ctx().stroke_color(), Some(&Color::Rgb(0.0, 0.0, 0.0)));
}

#[test]
fn test_unsupported_operator_is_skipped_and_recorded() {
    let page = Page::new(1, b"/Foo CS SCN 0 0 1 RG".to_vec());
    let registry = OperatorRegistry::standard();
    let mut device = ColorTraceDevice::new();
    let mut interp = PageInterpreter::new(&registry, &mut device, defaults());

    let report = interp.process_page(&page).unwrap();
    assert!(report.failures.is_empty());
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].operator, "SCN");
    assert_eq!(report.skipped[0].pos, 8);
    assert_eq!(
        report.skipped[0].space,
        ColorSpace::Unsupported(SmolStr::new("Foo"))
    );
    assert_eq!(interp.ctx().stroke_color(), Some(&Color::Rgb(0.0, 0.0, 1.0)));
}

#[test]
fn test_unsupported_policy_error() {
    let page = Page::new(1, b"/Foo CS SCN".to_vec());
    let registry = OperatorRegistry::standard();
    let mut device = ColorTraceDevice::new();
    let options = InterpretOptions {
        unsupported: UnsupportedPolicy::Error,
        ..defaults()
    };
    let mut interp = PageInterpreter::new(&registry, &mut device, options);

    let report = interp.process_page(&page).unwrap();
    assert!(report.skipped.is_empty());
    match &report.failures[0].error {
        PdfError::UnsupportedColorSpace { operator, space } => {
            assert_eq!(*operator, "SCN");
            assert_eq!(space, "Unsupported(Foo)");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_basic_operator_in_pattern_space_is_skipped() {
    let page = Page::new(1, b"/Pattern cs sc /P0 scn".to_vec());
    let registry = OperatorRegistry::standard();
    let mut device = ColorTraceDevice::new();
    let mut interp = PageInterpreter::new(&registry, &mut device, defaults());

    let report = interp.process_page(&page).unwrap();
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].operator, "sc");
    assert_eq!(
        interp.ctx().non_stroke_color().and_then(Color::pattern_name),
        Some("P0")
    );
}

#[test]
fn test_resources_resolved_from_page() {
    let resources = ResourceDictionary::new()
        .with_color_space("CS0", ColorSpace::IccBased { components: 4 })
        .with_color_space(
            "CS1",
            ColorSpace::Pattern {
                underlying: Some(Box::new(ColorSpace::DeviceGray)),
            },
        );
    let page = Page::new(1, b"/CS0 CS 0 0 0 1 SCN /CS1 cs 0.5 /P1 scn".to_vec())
        .with_resources(resources);

    let registry = OperatorRegistry::standard();
    let mut device = ColorTraceDevice::new();
    let mut interp = PageInterpreter::new(&registry, &mut device, InterpretOptions::default());
    let report = interp.process_page(&page).unwrap();

    assert!(report.is_clean());
    assert_eq!(
        interp.ctx().stroke_color(),
        Some(&Color::Cmyk(0.0, 0.0, 0.0, 1.0))
    );
    assert_eq!(
        interp.ctx().non_stroke_color(),
        Some(&Color::Pattern {
            name: SmolStr::new("P1"),
            base: Some(Box::new(Color::Gray(0.5))),
        })
    );
}

/// Test: content streams are interpreted as one, so operands may sit in a
/// different stream than their operator.
#[test]
fn test_multiple_streams_are_joined() {
    let page = Page::with_contents(1, vec![b"0.2 0.4".to_vec(), b"0.6 rg".to_vec()]);
    let registry = OperatorRegistry::standard();
    let mut device = ColorTraceDevice::new();
    let mut interp = PageInterpreter::new(&registry, &mut device, InterpretOptions::default());

    let report = interp.process_page(&page).unwrap();
    assert!(report.is_clean());
    assert_eq!(
        interp.ctx().non_stroke_color(),
        Some(&Color::Rgb(0.2, 0.4, 0.6))
    );
}

#[test]
fn test_cancellation_stops_pass() {
    let token = CancellationToken::new();
    token.cancel();
    let options = InterpretOptions {
        cancel: Some(token),
        ..defaults()
    };

    let registry = OperatorRegistry::standard();
    let mut device = PageCounter::default();
    let result = {
        let mut interp = PageInterpreter::new(&registry, &mut device, options);
        interp.process_page(&Page::new(1, b"1 g".to_vec()))
    };

    assert!(matches!(result, Err(PdfError::Cancelled)));
    assert_eq!(device.updates, 0);
    assert_eq!(device.ended, vec![1]);
}

#[test]
fn test_inline_image_operands_discarded() {
    let page = Page::new(1, b"0.5 BI /W 1 /H 1 ID \x00 EI g".to_vec());
    let registry = OperatorRegistry::standard();
    let mut device = ColorTraceDevice::new();
    let mut interp = PageInterpreter::new(&registry, &mut device, defaults());

    let report = interp.process_page(&page).unwrap();
    assert!(matches!(
        report.failures[0].error,
        PdfError::OperandCountMismatch {
            operator: "g",
            expected: 1,
            got: 0
        }
    ));
}

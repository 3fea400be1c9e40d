//! End-to-end tests for the PDF engines: template JSON in, PDF bytes out

use std::collections::BTreeMap;

use docflow_pdf::{
    blank_a4, blank_base, BasePdf, FieldSchema, FormFiller, FormTemplate, PdfError, PdfInfo,
    ReportLayout, ReportRow,
};

fn record(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// =============================================================================
// PART 1: FORM FILL
// =============================================================================

mod form_fill {
    use super::*;

    const CONTRACT: &str = r#"{
        "basePdf": "BLANK_PDF",
        "schemas": [[
            { "name": "title", "type": "text", "position": { "x": 20, "y": 20 }, "width": 170, "height": 12 },
            { "name": "client", "type": "text", "position": { "x": 20, "y": 40 }, "width": 170, "height": 12 },
            { "name": "details", "type": "text", "position": { "x": 20, "y": 60 }, "width": 170, "height": 80, "fontSize": 10 }
        ]]
    }"#;

    #[test]
    fn test_json_template_fill() {
        let template = FormTemplate::from_json(CONTRACT).unwrap();
        let out = FormFiller::fill(
            &template,
            &record(&[
                ("title", "Service contract"),
                ("client", "Zahidfest"),
                ("details", "Line one\nLine two"),
            ]),
        )
        .unwrap();

        let text = PdfInfo::load(&out.pdf).unwrap().text().unwrap();
        assert_eq!(text, "Service contract\nZahidfest\nLine one\nLine two");
    }

    #[test]
    fn test_filled_pdf_written_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("generated_document.pdf");

        let template = FormTemplate::from_json(CONTRACT).unwrap();
        let out = FormFiller::fill(&template, &record(&[("title", "On disk")])).unwrap();
        std::fs::write(&path, &out.pdf).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(PdfInfo::load(&bytes).unwrap().text().unwrap().contains("On disk"));
    }

    #[test]
    fn test_base_pdf_is_not_modified() {
        let base = blank_base(1).unwrap();
        let before = base.clone();
        let template = FormTemplate::from_json(CONTRACT)
            .unwrap()
            .with_base_pdf(BasePdf::Bytes(base.clone()));

        FormFiller::fill(&template, &record(&[("title", "x")])).unwrap();
        assert_eq!(base, before);
        assert_eq!(PdfInfo::load(&base).unwrap().page_text(1).unwrap(), "");
    }

    #[test]
    fn test_text_outside_the_box_is_clipped() {
        let template =
            FormTemplate::blank(vec![FieldSchema::text("note", 10.0, 10.0, 150.0, 6.0)]);
        let out =
            FormFiller::fill(&template, &record(&[("note", "first\nsecond\nthird")])).unwrap();
        assert_eq!(PdfInfo::load(&out.pdf).unwrap().page_text(1).unwrap(), "first");
    }

    #[test]
    fn test_garbage_base_is_rejected() {
        let template = FormTemplate::blank(Vec::new())
            .with_base_pdf(BasePdf::Bytes(b"PK\x03\x04".to_vec()));
        let err = FormFiller::fill(&template, &record(&[])).unwrap_err();
        assert!(matches!(err, PdfError::Load(_)));
    }
}

// =============================================================================
// PART 2: REPORTS
// =============================================================================

mod report {
    use super::*;

    #[test]
    fn test_company_report() {
        let layout = ReportLayout {
            title: Some("Company Details".to_string()),
            ..ReportLayout::with_rows(vec![
                ReportRow::new("Company", "companyName"),
                ReportRow::new("Address", "companyAddress"),
            ])
        };
        let out = layout
            .render(&record(&[
                ("companyName", "Festcloud.ai"),
                ("companyAddress", "Lviv, Ukraine"),
            ]))
            .unwrap();

        let info = PdfInfo::load(&out.pdf).unwrap();
        assert_eq!(info.page_count(), 1);
        assert_eq!(
            info.text().unwrap(),
            "Company Details\nCompany: Festcloud.ai\nAddress: Lviv, Ukraine"
        );
    }

    #[test]
    fn test_report_layout_from_json() {
        let layout: ReportLayout =
            serde_json::from_str(r#"{"rows":[{"label":"Phone","field":"companyPhoneNumber"}]}"#)
                .unwrap();
        assert_eq!(layout.font_size, 12.0);
        let out = layout
            .render(&record(&[("companyPhoneNumber", "032-12345678")]))
            .unwrap();
        assert_eq!(
            PdfInfo::load(&out.pdf).unwrap().text().unwrap(),
            "Phone: 032-12345678"
        );
    }
}

// =============================================================================
// PART 3: INSPECTION
// =============================================================================

mod inspection {
    use super::*;

    #[test]
    fn test_blank_a4_size() {
        let info = PdfInfo::load(&blank_a4().unwrap()).unwrap();
        let (w, h) = info.page_size(1).unwrap();
        assert!((w - 595.28).abs() < 0.01);
        assert!((h - 841.89).abs() < 0.01);
    }

    #[test]
    fn test_not_a_pdf() {
        assert!(matches!(PdfInfo::load(b""), Err(e) if e.is_template_error()));
    }
}

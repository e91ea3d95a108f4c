use super::*;
use std::io::Write;

fn pdf_bytes() -> Vec<u8> {
    b"%PDF-1.4\n1 0 obj\n<<>>\nendobj\ntrailer\n<<>>\n%%EOF\n".to_vec()
}

#[test]
fn target_roles_are_trimmed_and_blank_entries_dropped() {
    let roles = parse_target_roles(" Backend Developer, ,ML Engineer ,");
    assert_eq!(
        roles,
        vec![Role::from("Backend Developer"), Role::from("ML Engineer")]
    );
}

#[test]
fn upload_joins_roles_for_the_form_field() {
    let upload =
        ResumeUpload::new("cv.PDF", pdf_bytes(), "Data Analyst,  Data Scientist").expect("upload");
    assert_eq!(upload.target_roles_field(), "Data Analyst,Data Scientist");
    assert_eq!(upload.file_name(), "cv.PDF");
}

#[test]
fn non_pdf_resume_is_rejected() {
    let err = ResumeUpload::new("cv.docx", pdf_bytes(), "Data Analyst").expect_err("must fail");
    assert_eq!(
        err,
        UploadError::NotPdf {
            file_name: "cv.docx".into()
        }
    );
}

#[test]
fn empty_and_oversized_resumes_are_rejected() {
    assert_eq!(
        ResumeUpload::new("cv.pdf", Vec::new(), "Data Analyst").expect_err("empty"),
        UploadError::Empty
    );

    let oversized = vec![0u8; MAX_RESUME_BYTES + 1];
    assert_eq!(
        ResumeUpload::new("cv.pdf", oversized, "Data Analyst").expect_err("too large"),
        UploadError::TooLarge {
            size: MAX_RESUME_BYTES + 1,
            limit: MAX_RESUME_BYTES,
        }
    );
}

#[test]
fn blank_target_roles_are_rejected() {
    assert_eq!(
        ResumeUpload::new("cv.pdf", pdf_bytes(), " , ").expect_err("no roles"),
        UploadError::NoTargetRoles
    );
}

#[tokio::test]
async fn from_path_reads_the_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("resume.pdf");
    std::fs::File::create(&path)
        .and_then(|mut file| file.write_all(&pdf_bytes()))
        .expect("write pdf");

    let upload = ResumeUpload::from_path(&path, "Cloud Architect")
        .await
        .expect("upload");
    assert_eq!(upload.file_name(), "resume.pdf");
    assert_eq!(upload.bytes(), pdf_bytes().as_slice());
    assert_eq!(upload.target_roles(), &[Role::from("Cloud Architect")]);
}

#[tokio::test]
async fn from_path_reports_missing_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("missing.pdf");

    let err = ResumeUpload::from_path(&path, "Cloud Architect")
        .await
        .expect_err("must fail");
    assert!(matches!(err, UploadError::Read { .. }), "unexpected error: {err}");
}

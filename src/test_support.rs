// src/test_support.rs
// Fixtures shared by the network tests.

use httptest::{matchers::*, responders::*, Expectation, Server};

/// The first bytes of a PNG file: signature plus IHDR chunk.
pub fn png_header(width: u32, height: u32) -> Vec<u8> {
    let mut data = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    data.extend_from_slice(&13u32.to_be_bytes());
    data.extend_from_slice(b"IHDR");
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&height.to_be_bytes());
    data.extend_from_slice(&[8, 6, 0, 0, 0]);
    data.extend_from_slice(&[0, 0, 0, 0]);
    data
}

/// Serves `path` as a PNG: GET returns the header bytes, HEAD advertises
/// `file_size` bytes. Each is expected exactly once.
pub fn serve_image(server: &Server, path: &'static str, width: u32, height: u32, file_size: usize) {
    server.expect(
        Expectation::matching(request::method_path("GET", path))
            .respond_with(status_code(200).body(png_header(width, height))),
    );
    server.expect(
        Expectation::matching(request::method_path("HEAD", path)).respond_with(
            status_code(200)
                .insert_header("Content-Length", file_size.to_string())
                .body(vec![0u8; file_size]),
        ),
    );
}

/// Serves `html` at `path` and returns the page's absolute URL.
pub fn serve_page(server: &Server, path: &'static str, html: &str) -> String {
    server.expect(
        Expectation::matching(request::method_path("GET", path))
            .respond_with(status_code(200).body(html.to_string())),
    );
    server.url(path).to_string()
}

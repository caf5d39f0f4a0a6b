use axum::{response::Html, routing::get, Router};

use crate::formats::{accept_attribute, supported_formats};

const PAGE_TEMPLATE: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>Office to Markdown</title>
  <style>
    body { font-family: Arial, sans-serif; margin: 2rem auto; max-width: 760px; color: #1d1d1f; }
    h1 { margin-bottom: 0.5rem; }
    .card { border: 1px solid #ddd; padding: 1rem; border-radius: 8px; margin-bottom: 1rem; }
    .formats li { margin: 0.2rem 0; }
    button, .download { display: block; width: 100%; margin-top: 1rem; padding: 0.6rem 1rem; text-align: center; }
    .notice { padding: 0.5rem 0.75rem; border-radius: 6px; margin: 0.4rem 0; }
    .notice.ok { background: #e6f4ea; color: #1e6b34; }
    .notice.err { background: #fdecea; color: #8a1c12; }
    textarea { width: 100%; height: 300px; font-family: monospace; }
  </style>
</head>
<body>
  <h1>Office to Markdown</h1>
  <p>Upload one or more documents and convert them to Markdown.</p>

  <div class="card">
    <h2>Supported formats</h2>
    <ul class="formats">{{FORMATS}}</ul>
  </div>

  <div class="card">
    <label for="fileInput">Upload files to convert</label>
    <input id="fileInput" type="file" multiple accept="{{ACCEPT}}" title="Select one or more files to convert to Markdown" />
    <button id="convertBtn">Convert to Markdown</button>
    <div id="notices"></div>
  </div>

  <div id="results"></div>

  <script>
    const convertBtn = document.getElementById('convertBtn');
    const noticesEl = document.getElementById('notices');
    const resultsEl = document.getElementById('results');

    function showNotices(notices) {
      noticesEl.replaceChildren();
      for (const notice of notices) {
        const div = document.createElement('div');
        div.className = 'notice ' + (notice.is_error ? 'err' : 'ok');
        div.textContent = notice.message;
        noticesEl.appendChild(div);
      }
    }

    function showConversions(conversions) {
      resultsEl.replaceChildren();
      if (!conversions.length) return;
      const heading = document.createElement('h2');
      heading.textContent = 'Converted Files';
      resultsEl.appendChild(heading);

      for (const entry of conversions) {
        const card = document.createElement('div');
        card.className = 'card';

        const title = document.createElement('h3');
        title.textContent = entry.filename;
        card.appendChild(title);

        const link = document.createElement('a');
        link.className = 'download';
        link.href = '/api/conversions/' + encodeURIComponent(entry.filename) + '/download';
        link.textContent = 'Download ' + entry.download_name;
        card.appendChild(link);

        const details = document.createElement('details');
        const summary = document.createElement('summary');
        summary.textContent = 'Preview';
        const preview = document.createElement('textarea');
        preview.readOnly = true;
        preview.value = entry.preview;
        details.append(summary, preview);
        card.appendChild(details);

        resultsEl.appendChild(card);
      }
    }

    convertBtn.addEventListener('click', async () => {
      const fileInput = document.getElementById('fileInput');
      const formData = new FormData();
      for (const file of fileInput.files) {
        formData.append('file', file);
      }
      convertBtn.disabled = true;
      noticesEl.textContent = 'Converting...';
      try {
        const res = await fetch('/api/convert', { method: 'POST', body: formData });
        const json = await res.json();
        if (!res.ok) {
          showNotices([{ is_error: true, message: json.error || res.statusText }]);
          return;
        }
        showNotices(json.notices);
        showConversions(json.conversions);
      } catch (err) {
        showNotices([{ is_error: true, message: String(err) }]);
      } finally {
        convertBtn.disabled = false;
      }
    });

    fetch('/api/conversions')
      .then(res => res.json())
      .then(json => showConversions(json.conversions))
      .catch(() => {});
  </script>
</body>
</html>"#;

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn render_page() -> String {
    let formats: String = supported_formats()
        .iter()
        .map(|category| {
            format!(
                "<li><strong>{}</strong>: {}</li>",
                escape_html(category.label),
                escape_html(&category.formats.join(", "))
            )
        })
        .collect();

    PAGE_TEMPLATE
        .replace("{{FORMATS}}", &formats)
        .replace("{{ACCEPT}}", &accept_attribute())
}

pub fn router() -> Router {
    Router::new().route("/", get(index))
}

async fn index() -> Html<String> {
    Html(render_page())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_carries_upload_filter_and_formats() {
        let page = render_page();
        assert!(page.contains(r#"accept=".docx,.doc,.pdf,.epub,.xlsx,.xls,.pptx,.ppt""#));
        assert!(page.contains("Word (.docx, .doc), PDF, EPub"));
        assert!(page.contains("PowerPoint (.pptx, .ppt)"));
        assert!(!page.contains("{{"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a & \"b\">"), "&lt;a &amp; &quot;b&quot;&gt;");
    }
}

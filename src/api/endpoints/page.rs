//! The single-page front end. Talks to the JSON routes only.

use axum::response::Html;

/// `GET /`: upload, analyze, review and export.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>UrineVision AI</title>
  <style>
    * { box-sizing: border-box; margin: 0; padding: 0; }
    body {
      font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', system-ui, sans-serif;
      background: #f8fafc; color: #0f172a; padding: 24px;
      max-width: 960px; margin: 0 auto;
    }
    h1 { font-size: 26px; margin-bottom: 4px; }
    h2 { font-size: 18px; margin-bottom: 12px; }
    .subtitle { color: #64748b; font-size: 14px; margin-bottom: 24px; }
    .card {
      background: white; border: 1px solid #e2e8f0; border-radius: 12px;
      padding: 20px; margin-bottom: 20px;
    }
    .dropzone {
      border: 2px dashed #cbd5e1; border-radius: 12px; padding: 32px;
      text-align: center; cursor: pointer; color: #64748b;
    }
    .dropzone.dragging { border-color: #2563eb; background: #eff6ff; }
    .thumbs { display: grid; grid-template-columns: repeat(auto-fill, minmax(120px, 1fr)); gap: 12px; margin-top: 16px; }
    .thumb { position: relative; border: 1px solid #e2e8f0; border-radius: 8px; overflow: hidden; }
    .thumb img { width: 100%; height: 100px; object-fit: cover; display: block; }
    .thumb span { display: block; font-size: 11px; padding: 4px 6px; white-space: nowrap; overflow: hidden; text-overflow: ellipsis; }
    .thumb button {
      position: absolute; top: 4px; right: 4px; border: none; border-radius: 50%;
      width: 22px; height: 22px; background: rgba(15,23,42,0.7); color: white; cursor: pointer;
    }
    .actions { display: flex; gap: 12px; flex-wrap: wrap; margin-top: 16px; }
    .btn {
      padding: 12px 20px; border-radius: 8px; font-size: 15px; font-weight: 500;
      cursor: pointer; border: none;
    }
    .btn-primary { background: #2563eb; color: white; }
    .btn-secondary { background: white; color: #334155; border: 1px solid #cbd5e1; }
    .btn:disabled { opacity: 0.5; cursor: not-allowed; }
    .notice { font-size: 13px; margin-top: 12px; }
    .notice.error { color: #dc2626; }
    .notice.info { color: #64748b; }
    .findings { display: grid; grid-template-columns: repeat(auto-fill, minmax(220px, 1fr)); gap: 12px; }
    .finding { border-radius: 10px; padding: 14px; border: 1px solid #e2e8f0; }
    .finding .count { font-size: 28px; font-weight: 700; }
    .badge { display: inline-block; font-size: 11px; font-weight: 600; padding: 2px 8px; border-radius: 999px; }
    .color-success { background: #f0fdf4; }
    .color-warning { background: #fffbeb; }
    .color-destructive { background: #fef2f2; }
    .color-muted { background: #f8fafc; }
    .badge-default { background: #16a34a; color: white; }
    .badge-secondary { background: #f59e0b; color: white; }
    .badge-destructive { background: #dc2626; color: white; }
    .badge-outline { border: 1px solid #94a3b8; color: #475569; }
    ul { padding-left: 20px; font-size: 14px; }
    li { margin-bottom: 4px; }
    .clinical { background: #fef2f2; border: 1px solid #fecaca; color: #991b1b; border-radius: 8px; padding: 12px; font-size: 13px; margin-top: 12px; }
    #file-input { display: none; }
    #results { display: none; }
  </style>
</head>
<body>
  <h1>UrineVision AI</h1>
  <p class="subtitle">Automated urine sediment analysis. Upload microscopy images, run the detector, review findings and export a report.</p>

  <div class="card">
    <h2>Microscopy images</h2>
    <div class="dropzone" id="dropzone">Drop JPEG, PNG or TIFF images here, or click to choose files</div>
    <input type="file" id="file-input" multiple accept="image/jpeg,image/png,image/tiff">
    <div class="thumbs" id="thumbs"></div>
    <div class="notice" id="intake-notice"></div>
    <div class="actions">
      <button class="btn btn-primary" id="btn-analyze" disabled>Analyze</button>
      <button class="btn btn-secondary" id="btn-reset">Reset</button>
    </div>
  </div>

  <div class="card" id="results">
    <h2 id="result-title"></h2>
    <p class="subtitle" id="result-meta"></p>
    <div class="findings" id="findings"></div>
    <h2 style="margin-top:20px">Anomalies</h2>
    <ul id="anomalies"></ul>
    <h2 style="margin-top:20px">Preliminary findings</h2>
    <ul id="preliminary"></ul>
    <div class="clinical" id="clinical" style="display:none"></div>
    <div class="actions">
      <button class="btn btn-secondary" data-format="docx">Export DOCX</button>
      <button class="btn btn-secondary" data-format="xml">Export XML</button>
    </div>
  </div>

  <script>
    var dropzone = document.getElementById('dropzone');
    var fileInput = document.getElementById('file-input');
    var thumbs = document.getElementById('thumbs');
    var intakeNotice = document.getElementById('intake-notice');
    var btnAnalyze = document.getElementById('btn-analyze');
    var btnReset = document.getElementById('btn-reset');
    var resultsCard = document.getElementById('results');

    var workflow = 'idle';
    var staged = [];

    function notice(text, kind) {
      intakeNotice.textContent = text || '';
      intakeNotice.className = 'notice ' + (kind || 'info');
    }

    function errorMessage(body, fallback) {
      return body && body.error && body.error.message ? body.error.message : fallback;
    }

    function updateControls() {
      btnAnalyze.disabled = workflow === 'analyzing' || staged.length === 0;
      btnAnalyze.textContent = workflow === 'analyzing' ? 'Analyzing...' : 'Analyze';
    }

    function renderThumbs() {
      thumbs.innerHTML = '';
      staged.forEach(function(img) {
        var div = document.createElement('div');
        div.className = 'thumb';
        var el = document.createElement('img');
        el.src = img.preview_uri;
        el.alt = img.file_name;
        var label = document.createElement('span');
        label.textContent = img.file_name;
        var remove = document.createElement('button');
        remove.textContent = 'x';
        remove.title = 'Remove';
        remove.disabled = workflow === 'analyzing';
        remove.onclick = function() { unstage(img.id); };
        div.appendChild(el);
        div.appendChild(label);
        div.appendChild(remove);
        thumbs.appendChild(div);
      });
      updateControls();
    }

    function fill(listId, items) {
      var list = document.getElementById(listId);
      list.innerHTML = '';
      items.forEach(function(text) {
        var li = document.createElement('li');
        li.textContent = text;
        list.appendChild(li);
      });
    }

    function renderResult(view) {
      if (!view) { resultsCard.style.display = 'none'; return; }
      document.getElementById('result-title').textContent = view.title;
      document.getElementById('result-meta').textContent =
        'Processing time ' + view.processing_time_display +
        ' · overall accuracy ' + view.overall_accuracy_percent.toFixed(1) + '%' +
        ' · ' + view.abnormal_count + ' abnormal finding(s)';
      var findings = document.getElementById('findings');
      findings.innerHTML = '';
      view.findings.forEach(function(f) {
        var div = document.createElement('div');
        div.className = 'finding color-' + f.color;
        var badge = document.createElement('span');
        badge.className = 'badge badge-' + f.badge;
        badge.textContent = f.status_label;
        var name = document.createElement('div');
        name.textContent = f.cell_type + ' ';
        name.appendChild(badge);
        var count = document.createElement('div');
        count.className = 'count';
        count.textContent = f.count;
        var meta = document.createElement('div');
        meta.className = 'notice info';
        meta.textContent = 'Confidence ' + f.confidence.toFixed(1) + '% · reference ' + f.reference_range;
        div.appendChild(name);
        div.appendChild(count);
        div.appendChild(meta);
        findings.appendChild(div);
      });
      fill('anomalies', view.anomaly_notes);
      fill('preliminary', view.preliminary_findings);
      var clinical = document.getElementById('clinical');
      clinical.style.display = view.clinical_notice ? 'block' : 'none';
      clinical.textContent = view.clinical_notice || '';
      resultsCard.style.display = 'block';
    }

    function refresh() {
      return fetch('/api/analysis').then(function(r) { return r.json(); }).then(function(snap) {
        workflow = snap.state;
        staged = snap.staged;
        dropzone.title = 'Up to ' + snap.max_images + ' images, ' +
          Math.round(snap.max_file_size / (1024 * 1024)) + ' MB each';
        renderThumbs();
        if (snap.state === 'complete') {
          return fetch('/api/results').then(function(r) { return r.ok ? r.json() : null; }).then(renderResult);
        }
        renderResult(null);
      });
    }

    function upload(files) {
      if (!files.length) return;
      var form = new FormData();
      for (var i = 0; i < files.length; i++) form.append('files', files[i]);
      notice('Uploading...', 'info');
      fetch('/api/images', { method: 'POST', body: form })
        .then(function(r) { return r.json().then(function(body) { return { ok: r.ok, body: body }; }); })
        .then(function(res) {
          if (!res.ok) { notice(errorMessage(res.body, 'Upload failed'), 'error'); return; }
          var rejected = res.body.rejected.map(function(x) { return x.message; });
          notice(rejected.join(' '), rejected.length ? 'error' : 'info');
          return refresh();
        })
        .catch(function() { notice('Upload failed. Check your connection.', 'error'); });
    }

    function unstage(id) {
      fetch('/api/images/' + id, { method: 'DELETE' }).then(refresh);
    }

    dropzone.onclick = function() { fileInput.click(); };
    fileInput.onchange = function() { upload(fileInput.files); fileInput.value = ''; };
    dropzone.ondragover = function(e) { e.preventDefault(); dropzone.classList.add('dragging'); };
    dropzone.ondragleave = function() { dropzone.classList.remove('dragging'); };
    dropzone.ondrop = function(e) {
      e.preventDefault();
      dropzone.classList.remove('dragging');
      upload(e.dataTransfer.files);
    };

    btnAnalyze.onclick = function() {
      workflow = 'analyzing';
      renderThumbs();
      notice('Analyzing ' + staged.length + ' image(s)...', 'info');
      fetch('/api/analysis', { method: 'POST' })
        .then(function(r) { return r.json().then(function(body) { return { ok: r.ok, body: body }; }); })
        .then(function(res) {
          var superseded = !res.ok && res.body && res.body.error && res.body.error.code === 'SUPERSEDED';
          if (res.ok || superseded) notice('');
          else notice(errorMessage(res.body, 'Analysis failed'), 'error');
          return refresh();
        })
        .catch(function() { notice('Analysis failed. Check your connection.', 'error'); return refresh(); });
    };

    btnReset.onclick = function() {
      fetch('/api/analysis', { method: 'DELETE' }).then(function() { notice(''); return refresh(); });
    };

    document.querySelectorAll('[data-format]').forEach(function(btn) {
      btn.onclick = function() {
        window.location.href = '/api/report?format=' + btn.getAttribute('data-format');
      };
    });

    refresh();
  </script>
</body>
</html>
"#;

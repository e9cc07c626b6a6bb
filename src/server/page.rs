//! The single-page UI served at `/`.
//!
//! Credentials typed into the sidebar are pushed to the session endpoint and
//! never stored in the browser. Analyses are read as an SSE stream over
//! `fetch`, because `EventSource` cannot POST.

pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Candilyzer</title>
<style>
  :root { --accent: #3b82f6; --muted: #6b7280; --border: #e5e7eb; --bg: #f9fafb; }
  * { box-sizing: border-box; }
  body { margin: 0; font-family: system-ui, -apple-system, "Segoe UI", sans-serif; color: #111827; display: flex; min-height: 100vh; }
  aside { width: 300px; background: var(--bg); border-right: 1px solid var(--border); padding: 24px; }
  main { flex: 1; padding: 32px 48px; max-width: 1000px; }
  h1 { margin-top: 0; }
  label { display: block; font-size: 14px; font-weight: 600; margin: 16px 0 6px; }
  input[type=text], input[type=password], input[type=url], textarea {
    width: 100%; padding: 8px 10px; border: 1px solid var(--border); border-radius: 6px; font: inherit;
  }
  textarea { min-height: 120px; resize: vertical; }
  button { margin-top: 20px; background: var(--accent); color: #fff; border: 0; border-radius: 6px; padding: 10px 18px; font: inherit; cursor: pointer; }
  button:disabled { opacity: .5; cursor: default; }
  .nav label { font-weight: normal; display: flex; gap: 8px; align-items: center; margin: 8px 0; }
  .hint { color: var(--muted); font-size: 13px; }
  .page { display: none; }
  .page.active { display: block; }
  .alert { border-radius: 6px; padding: 10px 14px; margin-top: 16px; display: none; }
  .alert.error { background: #fef2f2; color: #991b1b; display: block; }
  .alert.success { background: #f0fdf4; color: #166534; display: block; }
  .alert.warning { background: #fffbeb; color: #92400e; display: block; }
  .busy { display: none; align-items: center; gap: 10px; margin-top: 16px; color: var(--muted); }
  .busy.on { display: flex; }
  .spinner { width: 16px; height: 16px; border: 2px solid var(--border); border-top-color: var(--accent); border-radius: 50%; animation: spin 1s linear infinite; }
  @keyframes spin { to { transform: rotate(360deg); } }
  .tools { font-family: ui-monospace, monospace; font-size: 12px; color: var(--muted); margin-top: 12px; }
  .output { margin-top: 16px; line-height: 1.55; }
  .output pre { background: var(--bg); padding: 12px; border-radius: 6px; overflow-x: auto; }
  .output table { border-collapse: collapse; }
  .output td, .output th { border: 1px solid var(--border); padding: 4px 8px; }
  .score { font-size: 20px; font-weight: 700; margin-top: 16px; }
</style>
</head>
<body>
<aside>
  <h3>Enter API Keys</h3>
  <label for="model_api_key">DeepSeek API Key</label>
  <input id="model_api_key" type="password" autocomplete="off">
  <label for="github_token">GitHub API Key</label>
  <input id="github_token" type="password" autocomplete="off">
  <label for="search_api_key">Exa API Key</label>
  <input id="search_api_key" type="password" autocomplete="off">
  <p class="hint" id="key-status">Keys are kept on the server until this tab is closed.</p>
  <hr>
  <div class="nav">
    <strong>Select Mode</strong>
    <label><input type="radio" name="mode" value="multi" checked> Multi-Candidate Analyzer</label>
    <label><input type="radio" name="mode" value="single"> Single Candidate Analyzer</label>
  </div>
</aside>
<main>
  <h1>Candilyzer</h1>
  <p class="hint">Elite GitHub and LinkedIn candidate analyzer for tech hiring.</p>

  <section class="page active" id="page-multi">
    <h2>Multi-Candidate Analyzer</h2>
    <form id="form-multi">
      <label for="github_usernames">Enter GitHub usernames (one per line)</label>
      <textarea id="github_usernames" name="github_usernames" placeholder="alice&#10;bob"></textarea>
      <label for="multi_job_role">Target Job Role</label>
      <input id="multi_job_role" name="job_role" type="text" placeholder="Backend Engineer">
      <button type="submit">Analyze Candidates</button>
    </form>
  </section>

  <section class="page" id="page-single">
    <h2>Single Candidate Analyzer</h2>
    <form id="form-single">
      <label for="github_username">GitHub Username</label>
      <input id="github_username" name="github_username" type="text">
      <label for="linkedin_url">LinkedIn Profile (optional)</label>
      <input id="linkedin_url" name="linkedin_url" type="url" placeholder="https://www.linkedin.com/in/...">
      <label for="single_job_role">Job Role</label>
      <input id="single_job_role" name="job_role" type="text">
      <button type="submit">Analyze Candidate</button>
    </form>
  </section>

  <div class="alert" id="alert"></div>
  <div class="busy" id="busy"><div class="spinner"></div><span>Evaluation in progress...</span></div>
  <div class="tools" id="tools"></div>
  <div class="output" id="output"></div>
  <div class="score" id="score"></div>
</main>

<script>
(function () {
  "use strict";
  const KEYS = ["model_api_key", "github_token", "search_api_key"];
  let sessionId = null;

  const $ = (id) => document.getElementById(id);

  async function newSession() {
    const res = await fetch("/api/session", { method: "POST" });
    const body = await res.json();
    sessionId = body.session_id;
  }

  function showKeyStatus(status) {
    const missing = KEYS.filter((k) => !status[k]).length;
    $("key-status").textContent = missing === 0
      ? "All keys entered."
      : missing + " of 3 keys missing.";
  }

  async function pushKeys() {
    const update = {};
    KEYS.forEach((k) => { update[k] = $(k).value; });
    let res = await fetch("/api/session/" + sessionId + "/credentials", {
      method: "PUT",
      headers: { "Content-Type": "application/json" },
      body: JSON.stringify(update),
    });
    if (res.status === 404) {
      await newSession();
      return pushKeys();
    }
    if (res.ok) showKeyStatus(await res.json());
  }

  KEYS.forEach((k) => $(k).addEventListener("change", pushKeys));

  document.querySelectorAll("input[name=mode]").forEach((radio) => {
    radio.addEventListener("change", () => {
      document.querySelectorAll(".page").forEach((p) => p.classList.remove("active"));
      $("page-" + radio.value).classList.add("active");
      reset();
    });
  });

  function reset() {
    setAlert("", "");
    $("tools").textContent = "";
    $("output").innerHTML = "";
    $("score").textContent = "";
  }

  function setAlert(kind, text) {
    const el = $("alert");
    el.className = "alert" + (kind ? " " + kind : "");
    el.textContent = text;
  }

  function escapeHtml(s) {
    return s.replace(/&/g, "&amp;").replace(/</g, "&lt;").replace(/>/g, "&gt;").replace(/"/g, "&quot;");
  }

  function inline(s) {
    return s
      .replace(/`([^`]+)`/g, "<code>$1</code>")
      .replace(/\*\*([^*]+)\*\*/g, "<strong>$1</strong>")
      .replace(/\*([^*]+)\*/g, "<em>$1</em>")
      .replace(/\[([^\]]+)\]\((https?:[^)\s]+)\)/g, '<a href="$2" target="_blank" rel="noopener">$1</a>');
  }

  // Minimal markdown: headings, lists, tables, code fences, paragraphs.
  function renderMarkdown(src) {
    const lines = escapeHtml(src).split("\n");
    const out = [];
    let list = null, code = false, table = false;
    const closeBlocks = () => {
      if (list) { out.push("</" + list + ">"); list = null; }
      if (table) { out.push("</table>"); table = false; }
    };
    for (const line of lines) {
      if (line.trim().startsWith("```")) {
        closeBlocks();
        out.push(code ? "</pre>" : "<pre>");
        code = !code;
        continue;
      }
      if (code) { out.push(line + "\n"); continue; }
      let m;
      if ((m = line.match(/^(#{1,6})\s+(.*)$/))) {
        closeBlocks();
        out.push("<h" + m[1].length + ">" + inline(m[2]) + "</h" + m[1].length + ">");
      } else if ((m = line.match(/^\s*[-*]\s+(.*)$/))) {
        if (list !== "ul") { closeBlocks(); out.push("<ul>"); list = "ul"; }
        out.push("<li>" + inline(m[1]) + "</li>");
      } else if ((m = line.match(/^\s*\d+\.\s+(.*)$/))) {
        if (list !== "ol") { closeBlocks(); out.push("<ol>"); list = "ol"; }
        out.push("<li>" + inline(m[1]) + "</li>");
      } else if (/^\s*\|.*\|\s*$/.test(line)) {
        if (/^\s*\|[\s:|-]+\|\s*$/.test(line)) continue;
        if (!table) { closeBlocks(); out.push("<table>"); table = true; }
        const cells = line.trim().slice(1, -1).split("|").map((c) => "<td>" + inline(c.trim()) + "</td>");
        out.push("<tr>" + cells.join("") + "</tr>");
      } else if (line.trim() === "") {
        closeBlocks();
      } else {
        closeBlocks();
        out.push("<p>" + inline(line) + "</p>");
      }
    }
    if (code) out.push("</pre>");
    closeBlocks();
    return out.join("\n");
  }

  async function readEvents(res, onEvent) {
    const reader = res.body.getReader();
    const decoder = new TextDecoder();
    let buf = "";
    for (;;) {
      const { value, done } = await reader.read();
      if (done) break;
      buf += decoder.decode(value, { stream: true });
      let idx;
      while ((idx = buf.indexOf("\n\n")) >= 0) {
        const raw = buf.slice(0, idx);
        buf = buf.slice(idx + 2);
        let event = "message", data = "";
        for (const line of raw.split("\n")) {
          if (line.startsWith("event:")) event = line.slice(6).trim();
          else if (line.startsWith("data:")) data += line.slice(5).trim();
        }
        if (data) onEvent(event, JSON.parse(data));
      }
    }
  }

  async function analyze(path, payload, form) {
    reset();
    const button = form.querySelector("button");
    button.disabled = true;
    $("busy").classList.add("on");
    let text = "";
    try {
      payload.session_id = sessionId;
      const res = await fetch(path, {
        method: "POST",
        headers: { "Content-Type": "application/json" },
        body: JSON.stringify(payload),
      });
      if (!res.ok) {
        const body = await res.json().catch(() => ({}));
        setAlert("error", (body.error && body.error.message) || ("Request failed: " + res.status));
        return;
      }
      await readEvents(res, (event, data) => {
        if (event === "tool") {
          $("tools").textContent += "Running " + data.name + "(" + data.arguments + ")\n";
        } else if (event === "fragment") {
          text += data.text;
          $("output").innerHTML = renderMarkdown(text);
        } else if (event === "done") {
          $("output").innerHTML = renderMarkdown(data.text);
          if (data.score !== null && data.score !== undefined) {
            $("score").textContent = "Score: " + data.score + "/100";
            setAlert("success", "Analysis complete.");
          } else {
            setAlert("warning", "Analysis complete. No score found in the report.");
          }
        } else if (event === "error") {
          setAlert("error", "Error: " + data.message);
        }
      });
    } catch (e) {
      setAlert("error", "Error: " + e.message);
    } finally {
      $("busy").classList.remove("on");
      button.disabled = false;
    }
  }

  $("form-multi").addEventListener("submit", (ev) => {
    ev.preventDefault();
    analyze("/api/analyze/multi", {
      github_usernames: $("github_usernames").value,
      job_role: $("multi_job_role").value,
    }, ev.target);
  });

  $("form-single").addEventListener("submit", (ev) => {
    ev.preventDefault();
    const linkedin = $("linkedin_url").value.trim();
    analyze("/api/analyze/single", {
      github_username: $("github_username").value,
      job_role: $("single_job_role").value,
      linkedin_url: linkedin === "" ? null : linkedin,
    }, ev.target);
  });

  // Ending the session drops its keys on the server.
  window.addEventListener("pagehide", () => {
    if (sessionId) fetch("/api/session/" + sessionId, { method: "DELETE", keepalive: true });
  });

  window.addEventListener("pageshow", (ev) => {
    if (ev.persisted) newSession().then(pushKeys);
  });

  newSession().then(pushKeys);
})();
</script>
</body>
</html>
"##;

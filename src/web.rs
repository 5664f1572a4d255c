//! Survey web UI: raw tokio TCP server with an embedded single-page app.
//!
//! ## Endpoints
//! - `GET /`        — the page
//! - `GET /state`   — JSON snapshot of the current phase
//! - `GET /begin`   — leave the intro screen, start round 0
//! - `GET /choose?side=left|right` — record a pick and advance
//! - `GET /image?round=N&side=left|right` — pair image as PNG, with the
//!   generative side darkened at serve time
//! - `GET /example?index=I` — intro example image, unfiltered
//!
//! Every state transition funnels through the one mutex-guarded session, so
//! concurrent connections cannot skip or repeat a round. The submission
//! attempt fires server-side on the first results-phase `/state` render,
//! inside the same lock.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use colored::*;
use reqwest::Client;
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

use crate::pairs::Side;
use crate::submit::{self, SubmissionReport};
use crate::{filter, Phase, SurveySession};

/// Shared per-process state: the single survey session plus submission
/// context. The session mutex is tokio's because the submission attempt
/// holds it across an await.
pub struct AppState {
    pub session: Mutex<SurveySession>,
    pub examples: Vec<PathBuf>,
    pub client: Client,
    pub form_url: String,
    pub no_submit: bool,
    pub last_submission: Mutex<Option<SubmissionReport>>,
}

impl AppState {
    pub fn new(
        session: SurveySession,
        examples: Vec<PathBuf>,
        form_url: String,
        no_submit: bool,
    ) -> Self {
        AppState {
            session: Mutex::new(session),
            examples,
            client: Client::new(),
            form_url,
            no_submit,
            last_submission: Mutex::new(None),
        }
    }
}

/// Embedded single-page application.
pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Image Authenticity Test</title>
<style>
*{margin:0;padding:0;box-sizing:border-box}
body{background:#0d1117;color:#c9d1d9;font-family:'Segoe UI',system-ui,sans-serif;min-height:100vh;display:flex;flex-direction:column}
header{padding:20px 32px 14px;border-bottom:1px solid #21262d}
header h1{font-size:1.4rem;color:#58a6ff;margin-bottom:4px}
header p{font-size:.85rem;color:#8b949e}
#app{flex:1;padding:24px 32px;max-width:1100px;width:100%;margin:0 auto}
h2{font-size:1.1rem;color:#c9d1d9;margin:12px 0 8px}
p.copy{font-size:.95rem;color:#8b949e;line-height:1.6;margin:8px 0}
.examples{display:grid;grid-template-columns:repeat(3,1fr);gap:16px;margin:16px 0}
.examples figure{background:#161b22;border:1px solid #21262d;border-radius:8px;padding:8px}
.examples img{width:100%;border-radius:4px;display:block}
.examples figcaption{font-size:.75rem;color:#8b949e;text-align:center;margin-top:6px}
.pair{display:grid;grid-template-columns:1fr 1fr;gap:20px;margin:16px 0}
.panel{background:#161b22;border:1px solid #21262d;border-radius:8px;padding:12px;display:flex;flex-direction:column;gap:10px}
.panel img{width:100%;border-radius:4px;display:block}
.panel .cap{font-size:.8rem;color:#8b949e;text-align:center}
button{background:#238636;color:#fff;border:none;padding:10px 20px;border-radius:6px;font-family:inherit;font-size:.9rem;cursor:pointer}
button:hover{background:#2ea043}
button:disabled{background:#21262d;color:#484f58;cursor:not-allowed}
.round-label{font-size:.85rem;color:#e3b341;font-weight:bold;margin:4px 0}
.banner{border-radius:6px;padding:12px 16px;margin:12px 0;font-size:.9rem}
.banner.ok{background:#0d2010;border:1px solid #1a3a28;color:#3fb950}
.banner.warn{background:#2a1d0d;border:1px solid #4a3516;color:#e3b341}
.banner.reveal{background:#1c1230;border:1px solid #3a2a5a;color:#a371f7}
.tallies{display:flex;gap:20px;margin:12px 0}
.tally-card{background:#161b22;border:1px solid #21262d;border-radius:6px;padding:12px 16px;flex:1}
.tally-card .n{font-size:1.6rem;font-weight:bold;color:#c9d1d9}
.tally-card .lbl{font-size:.75rem;color:#8b949e;text-transform:uppercase;letter-spacing:.5px}
.toggle{display:flex;align-items:center;gap:6px;font-size:.85rem;color:#8b949e;cursor:pointer;user-select:none;margin:10px 0}
.toggle input{accent-color:#58a6ff}
table{width:100%;border-collapse:collapse;font-size:.82rem;margin-top:8px}
th,td{border:1px solid #21262d;padding:6px 10px;text-align:left}
th{background:#161b22;color:#8b949e;text-transform:uppercase;font-size:.7rem;letter-spacing:.5px}
</style>
</head>
<body>
<header>
  <h1>Package Code Close-ups</h1>
  <p>An image authenticity test</p>
</header>
<div id="app"></div>
<script>
const app=document.getElementById('app');
async function refresh(){
  const s=await (await fetch('/state')).json();
  if(s.phase==='intro')renderIntro(s);
  else if(s.phase==='comparing')renderRound(s);
  else renderResults(s);
}
function renderIntro(s){
  let figs='';
  for(let i=0;i<s.example_count;i++){
    figs+='<figure><img src="/example?index='+i+'"><figcaption>Real package code example '+(i+1)+'</figcaption></figure>';
  }
  app.innerHTML=
    '<h2>First, let\'s look at some examples of real package codes:</h2>'+
    '<p class="copy">These are close-up images of laser printed codes on real packages.</p>'+
    '<div class="examples">'+figs+'</div>'+
    '<h2>Next, you\'ll see '+s.total_rounds+' pairs of images - one real and one synthetic.</h2>'+
    '<p class="copy">Your task is to identify which one is the real photograph.</p>'+
    '<button id="start">Start the Test</button>';
  document.getElementById('start').onclick=async()=>{await fetch('/begin');refresh();};
}
function renderRound(s){
  const r=s.round;
  app.innerHTML=
    '<h2>Which image is real?</h2>'+
    '<div class="round-label">Round '+(r+1)+' of '+s.total+'</div>'+
    '<div class="pair">'+
    '<div class="panel"><img src="/image?round='+r+'&side=left"><div class="cap">Image A</div><button data-side="left">Choose A</button></div>'+
    '<div class="panel"><img src="/image?round='+r+'&side=right"><div class="cap">Image B</div><button data-side="right">Choose B</button></div>'+
    '</div>';
  for(const btn of app.querySelectorAll('button[data-side]')){
    btn.onclick=async()=>{
      for(const b of app.querySelectorAll('button'))b.disabled=true;
      await fetch('/choose?side='+btn.dataset.side);
      refresh();
    };
  }
}
function renderResults(s){
  let sub='';
  if(s.submission)sub='<div class="banner '+(s.submission.ok?'ok':'warn')+'">'+s.submission.message+'</div>';
  let rows='';
  for(const r of s.results)rows+='<tr><td>'+r.round+'</td><td>'+r.side+'</td><td>'+r.method+'</td></tr>';
  app.innerHTML=
    '<div class="banner ok">Test completed! Thank you for participating.</div>'+
    '<div class="banner reveal"><b>Surprise!</b> All the images you saw in the test were actually synthetic - '+
    'there were no real photographs in the comparison rounds. You saw two kinds of synthetic images: '+
    '<b>Simulated</b> (pixel manipulation) and <b>Stable Diffusion XL</b> (AI-generated). '+
    'Your choices help us understand which method appears more realistic to human observers.</div>'+
    '<h2>Your Preferences</h2>'+
    '<div class="tallies">'+
    '<div class="tally-card"><div class="n">'+s.simulated_choices+'</div><div class="lbl">Simulated</div></div>'+
    '<div class="tally-card"><div class="n">'+s.generative_choices+'</div><div class="lbl">Stable Diffusion XL</div></div>'+
    '</div>'+
    '<div class="banner ok">Your preferred method was: <b>'+s.preferred+'</b></div>'+sub+
    '<label class="toggle"><input type="checkbox" id="details"> Show detailed results</label>'+
    '<div id="detail-table" style="display:none"><table><tr><th>Round</th><th>Choice</th><th>Method</th></tr>'+rows+'</table></div>';
  document.getElementById('details').onchange=e=>{
    document.getElementById('detail-table').style.display=e.target.checked?'block':'none';
  };
}
refresh();
</script>
</body>
</html>"##;

// ---------------------------------------------------------------------------
// Query helpers
// ---------------------------------------------------------------------------

/// Percent-decode a URL query value, byte-accurate so multi-byte UTF-8
/// sequences survive.
pub fn url_decode(s: &str) -> String {
    let mut out = Vec::with_capacity(s.len());
    let mut bytes = s.bytes();
    while let Some(b) = bytes.next() {
        match b {
            b'+' => out.push(b' '),
            b'%' => {
                let pair = [bytes.next(), bytes.next()];
                if let [Some(hi), Some(lo)] = pair {
                    if let Some(decoded) = hex_byte(hi, lo) {
                        out.push(decoded);
                    }
                }
            }
            other => out.push(other),
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_byte(hi: u8, lo: u8) -> Option<u8> {
    let hi = (hi as char).to_digit(16)?;
    let lo = (lo as char).to_digit(16)?;
    Some((hi * 16 + lo) as u8)
}

/// Parse a query string into key-value pairs.
pub fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let mut parts = pair.splitn(2, '=');
            let key = parts.next()?;
            let val = parts.next().unwrap_or("");
            Some((key.to_string(), url_decode(val)))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// State JSON
// ---------------------------------------------------------------------------

/// Snapshot the session as the JSON the page renders from.
///
/// Entering the results phase triggers the one submission attempt (skipped
/// entirely with `no_submit`, which just flips the guard). Later renders
/// reuse the stored report.
pub async fn build_state_json(state: &AppState) -> serde_json::Value {
    let mut session = state.session.lock().await;
    match session.phase() {
        Phase::Intro => json!({
            "phase": "intro",
            "example_count": state.examples.len(),
            "total_rounds": session.total_rounds(),
        }),
        Phase::Comparing => json!({
            "phase": "comparing",
            "round": session.current_round(),
            "total": session.total_rounds(),
        }),
        Phase::Results => {
            if !session.submitted() {
                if state.no_submit {
                    session.mark_submitted();
                } else if let Some(report) =
                    submit::submit_once(&mut session, &state.client, &state.form_url).await
                {
                    *state.last_submission.lock().await = Some(report);
                }
            }
            let submission = state.last_submission.lock().await.clone();
            let results: Vec<serde_json::Value> = session
                .results()
                .iter()
                .map(|r| {
                    json!({
                        "round": r.round,
                        "side": r.side.to_string(),
                        "method": r.method.label(),
                    })
                })
                .collect();
            json!({
                "phase": "results",
                "simulated_choices": session.tally(crate::pairs::Method::Simulated),
                "generative_choices": session.tally(crate::pairs::Method::GenerativeAi),
                "preferred": session.preferred_method(),
                "submission": submission,
                "results": results,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// Start the survey server and open the browser.
pub async fn serve(port: u16, state: Arc<AppState>) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(format!("127.0.0.1:{port}")).await?;

    eprintln!(
        "{}",
        format!("  Survey running at http://localhost:{port}").bright_green()
    );
    eprintln!("{}", "  Press Ctrl+C to stop.".bright_blue());

    #[cfg(target_os = "windows")]
    {
        let _ = std::process::Command::new("cmd")
            .args(["/C", &format!("start http://localhost:{port}")])
            .spawn();
    }
    #[cfg(target_os = "macos")]
    {
        let _ = std::process::Command::new("open")
            .arg(format!("http://localhost:{port}"))
            .spawn();
    }
    #[cfg(target_os = "linux")]
    {
        let _ = std::process::Command::new("xdg-open")
            .arg(format!("http://localhost:{port}"))
            .spawn();
    }

    loop {
        let (stream, _addr) = listener.accept().await?;
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, state).await {
                eprintln!("  connection error: {e}");
            }
        });
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    state: Arc<AppState>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut buf = vec![0u8; 8192];
    let n = stream.read(&mut buf).await?;
    let request = String::from_utf8_lossy(&buf[..n]);

    // Request line: "GET /path?query HTTP/1.1"
    let first_line = request.lines().next().unwrap_or("");
    let mut parts = first_line.split_whitespace();
    let (Some(_method), Some(path_and_query)) = (parts.next(), parts.next()) else {
        return Ok(());
    };

    let (path, query_str) = match path_and_query.find('?') {
        Some(idx) => (&path_and_query[..idx], &path_and_query[idx + 1..]),
        None => (path_and_query, ""),
    };
    let params = parse_query(query_str);

    match path {
        "/" => {
            write_response(&mut stream, "200 OK", "text/html; charset=utf-8", INDEX_HTML.as_bytes())
                .await?;
        }
        "/state" => {
            let body = build_state_json(&state).await.to_string();
            write_response(&mut stream, "200 OK", "application/json", body.as_bytes()).await?;
        }
        "/begin" => {
            {
                let mut session = state.session.lock().await;
                // A second tab pressing Start is harmless; the round does
                // not reset.
                let _ = session.begin();
            }
            let body = build_state_json(&state).await.to_string();
            write_response(&mut stream, "200 OK", "application/json", body.as_bytes()).await?;
        }
        "/choose" => {
            let side = params.get("side").and_then(|s| Side::from_query(s));
            let Some(side) = side else {
                return write_error(&mut stream, "400 Bad Request", "missing or invalid side").await;
            };
            let outcome = {
                let mut session = state.session.lock().await;
                session.choose(side)
            };
            match outcome {
                Ok(_) => {
                    let body = build_state_json(&state).await.to_string();
                    write_response(&mut stream, "200 OK", "application/json", body.as_bytes())
                        .await?;
                }
                Err(e) => {
                    write_error(&mut stream, "409 Conflict", &e.to_string()).await?;
                }
            }
        }
        "/image" => {
            let round = params.get("round").and_then(|r| r.parse::<usize>().ok());
            let side = params.get("side").and_then(|s| Side::from_query(s));
            let (Some(round), Some(side)) = (round, side) else {
                return write_error(&mut stream, "400 Bad Request", "missing round or side").await;
            };
            let target = {
                let session = state.session.lock().await;
                session
                    .pair(round)
                    .map(|pair| (pair.path_for(side).to_path_buf(), pair.method_for(side)))
            };
            let Some((path, method)) = target else {
                return write_error(&mut stream, "404 Not Found", "no such round").await;
            };
            match filter::load_for_display(&path, method) {
                Ok(bytes) => {
                    write_response(&mut stream, "200 OK", "image/png", &bytes).await?;
                }
                Err(e) => {
                    write_error(&mut stream, "500 Internal Server Error", &e.to_string()).await?;
                }
            }
        }
        "/example" => {
            let index = params.get("index").and_then(|i| i.parse::<usize>().ok());
            let Some(path) = index.and_then(|i| state.examples.get(i)) else {
                return write_error(&mut stream, "404 Not Found", "no such example").await;
            };
            match filter::load_raw(path) {
                Ok(bytes) => {
                    write_response(&mut stream, "200 OK", "image/png", &bytes).await?;
                }
                Err(e) => {
                    write_error(&mut stream, "500 Internal Server Error", &e.to_string()).await?;
                }
            }
        }
        _ => {
            write_error(&mut stream, "404 Not Found", "Not Found").await?;
        }
    }

    Ok(())
}

async fn write_response(
    stream: &mut TcpStream,
    status: &str,
    content_type: &str,
    body: &[u8],
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let header = format!(
        "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    stream.write_all(header.as_bytes()).await?;
    stream.write_all(body).await?;
    Ok(())
}

async fn write_error(
    stream: &mut TcpStream,
    status: &str,
    message: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let body = serde_json::json!({ "error": message }).to_string();
    write_response(stream, status, "application/json", body.as_bytes()).await
}

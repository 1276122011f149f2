//! Interface de terminal do stemsplit — spinner e saída colorida.
//!
//! Usa as crates `indicatif` para o spinner de progresso e `console` para
//! estilização com cores. O [`PollProgress`] acompanha visualmente o
//! esvaziamento do lote no terminal; as funções livres imprimem eventos
//! pontuais (upload, download, falhas por arquivo).

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::batch::{BatchReport, JobState};

pub fn info(message: &str) {
    println!("{message}");
}

pub fn success(message: &str) {
    println!("  {} {message}", Style::new().green().bold().apply_to("✓"));
}

pub fn failure(message: &str) {
    println!("  {} {message}", Style::new().red().bold().apply_to("✗"));
}

pub fn warn(message: &str) {
    println!("  {} {message}", Style::new().yellow().apply_to("!"));
}

/// Indicador visual do laço de polling de um lote.
///
/// Exibe um spinner com a contagem de jobs pendentes e imprime linhas
/// coloridas para cada evento por job sem quebrar a animação.
pub struct PollProgress {
    // Spinner do indicatif.
    pb: ProgressBar,
    green: Style,
    red: Style,
    yellow: Style,
}

impl PollProgress {
    /// Inicia o spinner para um lote com `total` jobs.
    pub fn start(total: usize) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .expect("invalid template"),
        );
        pb.set_message(format!("waiting on {total}/{total} jobs"));
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }

    /// Atualiza a contagem de jobs ainda não terminais.
    pub fn update(&self, outstanding: usize, total: usize) {
        self.pb
            .set_message(format!("waiting on {outstanding}/{total} jobs"));
    }

    pub fn job_started(&self, job_id: &str) {
        self.pb.println(format!("  processing job {job_id}..."));
    }

    pub fn job_succeeded(&self, job_id: &str) {
        self.pb.println(format!(
            "  {} job {job_id} finished",
            self.green.apply_to("✓")
        ));
    }

    pub fn job_failed(&self, job_id: &str, detail: &str) {
        self.pb.println(format!(
            "  {} job {job_id} failed: {detail}",
            self.red.apply_to("✗")
        ));
    }

    /// Falha transitória do próprio check — será retentado no próximo tick.
    pub fn transient_error(&self, error: &str) {
        self.pb.println(format!(
            "  {} status check failed, retrying: {error}",
            self.yellow.apply_to("↻")
        ));
    }

    /// Resposta fora do vocabulário conhecido para um job; o registro fica
    /// intocado e volta a ser consultado.
    pub fn protocol_error(&self, job_id: &str, error: &str) {
        self.pb.println(format!(
            "  {} job {job_id}: {error}",
            self.yellow.apply_to("?")
        ));
    }

    pub fn timed_out(&self, affected: usize) {
        self.pb.println(format!(
            "  {} deadline expired, {affected} job(s) timed out",
            self.yellow.apply_to("⏱")
        ));
    }

    /// Finaliza e limpa o spinner.
    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

fn fmt_speed(speed: Option<f64>) -> String {
    match speed {
        Some(value) => format!("{value:.4}"),
        None => "undef".to_string(),
    }
}

/// Imprime o relatório final do lote com contagens e métricas de tempo.
pub fn print_report(report: &BatchReport) {
    let green = Style::new().green().bold();
    let red = Style::new().red().bold();
    let bold = Style::new().bold();

    println!();
    println!("{}", bold.apply_to("─── Batch Report ───"));

    for (path, error) in &report.upload_failures {
        println!(
            "  {} {} was not uploaded: {error}",
            red.apply_to("✗"),
            path.display()
        );
    }
    for job in &report.succeeded {
        println!(
            "  {} {} (job {}): {:.2}s elapsed, duration {:.1}s, speed {}",
            green.apply_to("✓"),
            job.source_path.display(),
            job.job_id,
            job.elapsed_secs,
            job.source_duration_secs,
            fmt_speed(job.speed),
        );
    }
    for job in &report.failed {
        let marker = match job.state {
            JobState::TimedOut => "⏱",
            _ => "✗",
        };
        println!(
            "  {} {} (job {}): {} — {}",
            red.apply_to(marker),
            job.source_path.display(),
            job.job_id,
            job.state,
            job.detail,
        );
    }

    println!(
        "  {} succeeded, {} failed, {} upload failure(s)",
        report.succeeded.len(),
        report.failed.len(),
        report.upload_failures.len(),
    );
    println!(
        "  max process time: {:.2}s, total duration: {:.1}s, avg speed: {}",
        report.max_elapsed_secs,
        report.total_duration_secs,
        fmt_speed(report.average_speed),
    );
}

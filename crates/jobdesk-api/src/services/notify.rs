//! Notification composition.
//!
//! Pure functions that build the HTML bodies sent by the submission and
//! transition workflows. Nothing here touches the network, so every
//! template is unit-testable as plain string assembly.

use serde_json::Value;

use jobdesk_db::StaffContact;

pub const SUBJECT_APPLICATION_RECEIVED: &str = "Application Received";
pub const SUBJECT_NEW_CANDIDATE: &str = "You've got a new candidate";
pub const SUBJECT_INTERVIEW_CANDIDATES: &str = "List of candidates for job interview";
pub const SUBJECT_SELECTION_RESULT: &str = "List of selected candidates";

/// Candidate records arrive with inconsistent key casing depending on the
/// client screen that produced them: hire requests send PascalCase name
/// keys, interview and result requests send camelCase. The `title` key is
/// lowercase in both.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NameKeyStyle {
    Pascal,
    Camel,
}

#[derive(Clone, Debug, Default)]
pub struct Candidate {
    pub title: String,
    pub first_name_thai: String,
    pub last_name_thai: String,
}

impl Candidate {
    pub fn from_value(value: &Value, style: NameKeyStyle) -> Self {
        let (first_key, last_key) = match style {
            NameKeyStyle::Pascal => ("FirstNameThai", "LastNameThai"),
            NameKeyStyle::Camel => ("firstNameThai", "lastNameThai"),
        };
        Candidate {
            title: str_field(value, "title"),
            first_name_thai: str_field(value, first_key),
            last_name_thai: str_field(value, last_key),
        }
    }

    pub fn display_name(&self) -> String {
        format!(
            "{} {} {}",
            self.title, self.first_name_thai, self.last_name_thai
        )
        .trim()
        .to_string()
    }
}

fn str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Ordered contact list for hire requests, one numbered line per candidate.
pub fn ranked_candidate_lines(candidates: &[Candidate]) -> String {
    candidates
        .iter()
        .enumerate()
        .map(|(i, c)| format!("ลำดับที่ {}: {}", i + 1, c.display_name()).trim().to_string())
        .collect::<Vec<_>>()
        .join("<br>")
}

/// Space-joined names, used by interview-call summaries.
pub fn joined_candidate_names(candidates: &[Candidate]) -> String {
    candidates
        .iter()
        .map(Candidate::display_name)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Acknowledgement sent to the applicant after a successful submission.
pub fn application_received_body(
    company_name: &str,
    applicant_name_thai: &str,
    job_title: &str,
    hr_contact: Option<&StaffContact>,
) -> String {
    let hr_email = hr_contact.map(|c| c.email.as_str()).unwrap_or("-");
    let hr_name = hr_contact
        .map(|c| c.name_thai.as_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("-");
    let hr_tel = hr_contact
        .map(|c| c.tel_off.as_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("-");
    format!(
        "<div style='font-family: Arial, sans-serif; background-color: #f4f4f4; padding: 20px; font-size: 14px; line-height: 1.6;'>\
            <p style='margin: 0; font-weight: bold;'>{company_name}: ได้รับใบสมัครงานของคุณแล้ว</p>\
            <p style='margin: 0;'>เรียน คุณ {applicant_name_thai}</p>\
            <p>\
                ขอบคุณสำหรับความสนใจในตำแหน่ง <strong>{job_title}</strong> ที่บริษัท <strong>{company_name}</strong> ของเรา<br>\
                เราได้รับใบสมัครของท่านเรียบร้อยแล้ว ทีมงานฝ่ายทรัพยากรบุคคลของเราจะพิจารณาใบสมัครของท่าน และจะติดต่อกลับภายใน 7-14 วันทำการ หากคุณสมบัติของท่านตรงตามที่เรากำลังมองหา<br><br>\
                หากมีข้อสงสัยหรือต้องการข้อมูลเพิ่มเติม สามารถติดต่อเราได้ที่อีเมล \
                <span style='color: blue;'>{hr_email}</span> หรือโทร \
                <span style='color: blue;'>{hr_tel}</span><br>\
                ขอบคุณอีกครั้งสำหรับความสนใจร่วมงานกับเรา\
            </p>\
            <p style='margin-top: 30px; margin:0'>ด้วยความเคารพ,</p>\
            <p style='margin: 0;'>{hr_name}</p>\
            <p style='margin: 0;'>ฝ่ายทรัพยากรบุคคล</p>\
            <p style='margin: 0;'>{company_name}</p>\
            <br>\
            <p style='color:red; font-weight: bold;'>**อีเมลนี้คือข้อความอัตโนมัติ กรุณาอย่าตอบกลับ**</p>\
        </div>"
    )
}

/// Internal notice to hiring staff that a new application arrived, with a
/// deep link into the review screen.
pub fn new_candidate_body(
    applicant_name_thai: &str,
    job_title: &str,
    form_url: &str,
    applicant_id: i32,
) -> String {
    format!(
        "<div style='font-family: Arial, sans-serif; background-color: #f4f4f4; padding: 20px; font-size: 14px; line-height: 1.6;'>\
            <p style='margin: 0;'>เรียนทุกท่าน</p>\
            <p style='margin: 0;'>เรื่อง: แจ้งข้อมูลผู้สมัครตำแหน่ง <strong>{job_title}</strong></p>\
            <p style='margin: 0;'>ทางฝ่ายรับสมัครงานขอแจ้งให้ทราบว่า คุณ <strong>{applicant_name_thai}</strong> ได้ทำการสมัครงานเข้ามาในตำแหน่ง <strong>{job_title}</strong></p>\
            <p style='margin: 0;'>กรุณาคลิก Link:\
                <a target='_blank' href='{form_url}?id={applicant_id}'\
                    style='color: #007bff; text-decoration: underline;'>\
                    {form_url}\
                </a>\
                เพื่อดูรายละเอียดและดำเนินการในขั้นตอนต่อไป\
            </p>\
            <br>\
            <p style='color: red; font-weight: bold;'>**อีเมลนี้คือข้อความอัตโนมัติ กรุณาอย่าตอบกลับ**</p>\
        </div>"
    )
}

/// Hire request sent to HR staff: the requesting manager's contact details
/// plus the ranked list of candidates to call, in order.
#[allow(clippy::too_many_arguments)]
pub fn hire_request_body(
    department_contact: &str,
    requester_name: &str,
    requester_tel: &str,
    requester_mail: &str,
    job_title: &str,
    candidate_lines: &str,
    admin_login_url: &str,
) -> String {
    format!(
        "<div style='font-family: Arial, sans-serif; background-color: #f4f4f4; padding: 20px; font-size: 14px;'>\
            <p style='font-weight: bold; margin: 0 0 10px 0;'>เรียน ฝ่ายทรัพยากรบุคคล</p>\
            <br>\
            <p style='margin: 0 0 10px 0;'>\
                เรียน ฝ่ายสรรหาบุคลากร<br>\
                ทาง Hiring Manager แผนก {department_contact} <br> คุณ {requester_name} เบอร์โทร: {requester_tel} อีเมล: {requester_mail} <br> \
                มีการส่งคำร้องให้ท่าน ทำการติดต่อผู้สมัครเพื่อตกลงการจ้างงาน ในตำแหน่ง {job_title}\
            </p>\
            <p style='margin: 0 0 10px 0;'>\
                โดยมี ลำดับรายชื่อการติดต่อดังนี้ <br> {candidate_lines}\
            </p>\
            <br>\
            <p style='margin: 0 0 10px 0;'><span style='color: red; font-weight: bold;'>*</span> โดยให้ทำการติดต่อ ผู้สมัครลำดับที่ 1 ก่อน หากเจรจาไม่สำเร็จ ให้ทำการติดต่อกับผู้สมัครลำดับต่อไป <span style='color: red; font-weight: bold;'>*</span></p>\
            <p style='margin: 0 0 10px 0;'><span style='color: red; font-weight: bold;'>*</span> กรุณา Login เข้าสู่ระบบ {admin_login_url} และไปที่ Menu การว่าจ้าง เพื่อตอบกลับคำขอนี้ <span style='color: red; font-weight: bold;'>*</span></p>\
            <br>\
            <p style='color: red; font-weight: bold;'>**Email อัตโนมัติ โปรดอย่าตอบกลับ**</p>\
        </div>"
    )
}

/// Interview call summary sent to HR staff for the `Selected` transition.
#[allow(clippy::too_many_arguments)]
pub fn interview_request_body(
    job_title: &str,
    candidate_count: usize,
    joined_names: &str,
    requester_name: &str,
    requester_post: &str,
    requester_tel: &str,
    requester_tel_off: &str,
    requester_mail: &str,
) -> String {
    format!(
        "<div style='font-family: Arial, sans-serif; background-color: #f4f4f4; padding: 20px; font-size: 14px;'>\
            <p style='font-weight: bold; margin: 0 0 10px 0;'>เรียน ฝ่ายทรัพยากรบุคคล</p>\
            <p style='font-weight: bold; margin: 0 0 10px 0;'>เรื่อง: การเรียกสัมภาษณ์ผู้สมัครตำแหน่ง {job_title}</p>\
            <br>\
            <p style='margin: 0 0 10px 0;'>\
                เรียน ฝ่ายบุคคล<br>\
                ตามที่ได้รับแจ้งข้อมูลผู้สมัครในตำแหน่ง {job_title} จำนวน {candidate_count} ท่าน ผมได้พิจารณาประวัติและคุณสมบัติเบื้องต้นแล้ว และประสงค์จะขอเรียกผู้สมัครดังต่อไปนี้เข้ามาสัมภาษณ์\
            </p>\
            <p style='margin: 0 0 10px 0;'>\
                จากข้อมูลผู้สมัคร ดิฉัน/ผมเห็นว่า {joined_names} มีคุณสมบัติที่เหมาะสมกับตำแหน่งงาน และมีความเชี่ยวชาญในทักษะที่จำเป็นต่อการทำงานในทีมของเรา\
            </p>\
            <br>\
            <p style='margin: 0 0 10px 0;'>ขอความกรุณาฝ่ายบุคคลประสานงานกับผู้สมัครเพื่อนัดหมายการสัมภาษณ์</p>\
            <p style='margin: 0 0 10px 0;'>หากท่านมีข้อสงสัยประการใด กรุณาติดต่อได้ที่เบอร์ด้านล่าง</p>\
            <p style='margin: 0 0 10px 0;'>ขอบคุณสำหรับความช่วยเหลือ</p>\
            <p style='margin: 0 0 10px 0;'>ขอแสดงความนับถือ</p>\
            <p style='margin: 0 0 10px 0;'>{requester_name}</p>\
            <p style='margin: 0 0 10px 0;'>{requester_post}</p>\
            <p style='margin: 0 0 10px 0;'>โทร: {requester_tel} ต่อ {requester_tel_off}</p>\
            <p style='margin: 0 0 10px 0;'>อีเมล: {requester_mail}</p>\
            <br>\
            <p style='color: red; font-weight: bold;'>**อีเมลนี้เป็นข้อความอัตโนมัติ กรุณาอย่าตอบกลับ**</p>\
        </div>"
    )
}

/// Result notification for the `notiMail` pseudo-transition: sent to the
/// original requester with a link to continue the process.
pub fn selection_result_body(requester_name: &str, job_title: &str, result_link: &str) -> String {
    format!(
        "<div style='font-family: Arial, sans-serif; background-color: #f4f4f4; padding: 20px; font-size: 14px;'>\
            <p style='font-weight: bold; margin: 0 0 10px 0;'>เรียน {requester_name}</p>\
            <p style='font-weight: bold; margin: 0 0 10px 0;'>เรื่อง: ผลสัมภาษณ์ผู้สมัครตำแหน่ง {job_title}</p>\
            <br>\
            <p style='margin: 0 0 10px 0;'>\
                ตามที่ท่านได้สมัครในตำแหน่ง {job_title} ทางบริษัทได้พิจารณาให้คุณผ่านการคัดเลือก กรุณาเข้าไปกรอกรายละเอียดของท่าน ตามลิงก์ด้านล่าง\
            </p>\
            <p style='margin: 0 0 10px 0;'>\
                Link : {result_link}\
            </p>\
            <br>\
            <p style='color: red; font-weight: bold;'>**อีเมลนี้เป็นข้อความอัตโนมัติ กรุณาอย่าตอบกลับ**</p>\
        </div>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pascal_candidate(title: &str, first: &str, last: &str) -> Candidate {
        Candidate::from_value(
            &json!({"title": title, "FirstNameThai": first, "LastNameThai": last}),
            NameKeyStyle::Pascal,
        )
    }

    #[test]
    fn ranked_lines_are_numbered_from_one() {
        let candidates = vec![
            pascal_candidate("นาย", "สมชาย", "ใจดี"),
            pascal_candidate("นางสาว", "สมหญิง", "รักเรียน"),
            pascal_candidate("นาย", "วิชัย", "มั่นคง"),
        ];
        let lines = ranked_candidate_lines(&candidates);
        assert!(lines.contains("ลำดับที่ 1: นาย สมชาย ใจดี"));
        assert!(lines.contains("ลำดับที่ 2: นางสาว สมหญิง รักเรียน"));
        assert!(lines.contains("ลำดับที่ 3: นาย วิชัย มั่นคง"));
        assert_eq!(lines.matches("<br>").count(), 2);
        let pos1 = lines.find("ลำดับที่ 1").unwrap();
        let pos3 = lines.find("ลำดับที่ 3").unwrap();
        assert!(pos1 < pos3);
    }

    #[test]
    fn pascal_candidate_ignores_camel_keys() {
        let value = json!({"title": "นาย", "firstNameThai": "สมชาย", "lastNameThai": "ใจดี"});
        let candidate = Candidate::from_value(&value, NameKeyStyle::Pascal);
        assert_eq!(candidate.display_name(), "นาย");
    }

    #[test]
    fn camel_candidate_reads_camel_keys() {
        let value = json!({"title": "นาย", "firstNameThai": "สมชาย", "lastNameThai": "ใจดี"});
        let candidate = Candidate::from_value(&value, NameKeyStyle::Camel);
        assert_eq!(candidate.display_name(), "นาย สมชาย ใจดี");
    }

    #[test]
    fn joined_names_are_space_separated() {
        let candidates = vec![
            pascal_candidate("นาย", "สมชาย", "ใจดี"),
            pascal_candidate("", "สมหญิง", "รักเรียน"),
        ];
        assert_eq!(
            joined_candidate_names(&candidates),
            "นาย สมชาย ใจดี สมหญิง รักเรียน"
        );
    }

    #[test]
    fn application_received_falls_back_to_dashes_without_hr_contact() {
        let body = application_received_body("Acme", "สมชาย ใจดี", "Backend Engineer", None);
        assert!(body.contains("Acme: ได้รับใบสมัครงานของคุณแล้ว"));
        assert!(body.contains("เรียน คุณ สมชาย ใจดี"));
        assert!(body.contains("<span style='color: blue;'>-</span>"));
    }

    #[test]
    fn new_candidate_body_links_to_review_screen() {
        let body = new_candidate_body("สมชาย ใจดี", "Backend Engineer", "https://jobs.example.com/review", 42);
        assert!(body.contains("href='https://jobs.example.com/review?id=42'"));
        assert!(body.contains("<strong>สมชาย ใจดี</strong>"));
    }

    #[test]
    fn selection_result_addresses_the_requester() {
        let body = selection_result_body("สมศรี", "Backend Engineer", "https://jobs.example.com/login");
        assert!(body.contains("เรียน สมศรี"));
        assert!(body.contains("Link : https://jobs.example.com/login"));
    }
}

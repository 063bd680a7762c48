use crate::{ClassRole, PrimaryKey};

/// Zero-based page request for roster queries
#[derive(Debug, Clone, Copy)]
pub struct PageParams {
    pub page: u32,
    pub size: u32,
}

impl Default for PageParams {
    fn default() -> Self {
        PageParams { page: 0, size: 20 }
    }
}

/// A single roster entry
#[derive(Debug, Clone, PartialEq)]
pub struct MemberInfo {
    pub user_id: PrimaryKey,
    pub username: String,
    pub role: ClassRole,
}

/// One page of a class roster, along with the totals of the whole result
#[derive(Debug, Clone)]
pub struct MemberPage {
    pub class_id: PrimaryKey,
    pub class_name: String,
    pub members: Vec<MemberInfo>,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub total_elements: u64,
}

impl MemberPage {
    /// Slices the full member list into the requested page. A page past the
    /// end comes back empty but still reports the correct totals.
    pub fn paginate(
        class_id: PrimaryKey,
        class_name: String,
        members: Vec<MemberInfo>,
        params: PageParams,
    ) -> Self {
        let size = params.size.max(1) as usize;

        let total_elements = members.len();
        let total_pages = (total_elements + size - 1) / size;

        let start = params.page as usize * size;
        let end = (start + size).min(total_elements);

        let members = if start >= total_elements {
            Vec::new()
        } else {
            members[start..end].to_vec()
        };

        Self {
            class_id,
            class_name,
            members,
            page: params.page,
            page_size: size as u32,
            total_pages: total_pages as u32,
            total_elements: total_elements as u64,
        }
    }
}
